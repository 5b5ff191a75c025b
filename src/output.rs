use std::{
    cell::RefCell,
    rc::Rc,
};


/// Where `print`, `println` and `time` write to.
pub trait Output {
    fn write_line(&mut self, line: &str);
}


pub struct Stdout;
impl Output for Stdout {
    fn write_line(&mut self, line: &str) {
        println!("{line}");
    }
}


/// Keeps every line in a shared buffer.
#[derive(Debug, Clone, Default)]
pub struct Captured(Rc<RefCell<Vec<String>>>);
impl Captured {
    pub fn new()->Self {
        Self::default()
    }

    pub fn lines(&self)->Vec<String> {
        self.0.borrow().clone()
    }
}
impl Output for Captured {
    fn write_line(&mut self, line: &str) {
        self.0.borrow_mut().push(line.to_string());
    }
}
