//! Output destination for the `print` built-in.
//!
//! Game hosts usually forward script output to an in-game console; tests
//! capture it in a buffer.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

type LineFn = Box<dyn Fn(&str) + Send + Sync>;

pub enum PrintHandler {
    /// Write each line to stdout.
    Stdout,
    /// Accumulate lines, newline-terminated.
    Buffer(Mutex<String>),
    /// Hand each line to a host callback.
    Forward(LineFn),
}

impl PrintHandler {
    pub fn println(&self, line: &str) {
        match self {
            PrintHandler::Stdout => println!("{line}"),
            PrintHandler::Buffer(buf) => {
                let mut buf = buf.lock();
                buf.push_str(line);
                buf.push('\n');
            }
            PrintHandler::Forward(f) => f(line),
        }
    }

    /// Captured output. Empty for handlers that do not capture.
    pub fn output(&self) -> String {
        match self {
            PrintHandler::Buffer(buf) => buf.lock().clone(),
            _ => String::new(),
        }
    }

    pub fn clear(&self) {
        if let PrintHandler::Buffer(buf) = self {
            buf.lock().clear();
        }
    }
}

impl fmt::Debug for PrintHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrintHandler::Stdout => "Stdout",
            PrintHandler::Buffer(_) => "Buffer",
            PrintHandler::Forward(_) => "Forward",
        };
        write!(f, "PrintHandler::{name}")
    }
}

pub type SharedPrintHandler = Arc<PrintHandler>;

pub fn stdout_handler() -> SharedPrintHandler {
    Arc::new(PrintHandler::Stdout)
}

pub fn buffer_handler() -> SharedPrintHandler {
    Arc::new(PrintHandler::Buffer(Mutex::new(String::new())))
}

pub fn forward_handler(f: impl Fn(&str) + Send + Sync + 'static) -> SharedPrintHandler {
    Arc::new(PrintHandler::Forward(Box::new(f)))
}
