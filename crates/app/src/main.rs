//! Headless rover-race binary: the race core behind a line-oriented JSON
//! shell on stdin/stdout.

mod console_view;
mod shell;

fn main() {
    shell::run_shell();
}
