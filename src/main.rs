use std::path::PathBuf;
use std::{env, process};

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use lox::Lox;

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut lox = Lox::new();

    match args.len() {
        n if n > 2 => {
            println!("Usage: lox [script]");
            process::exit(64);
        }
        2 => lox.run_file(&args[1]),
        _ => run_prompt(&mut lox),
    }
}

fn history_path() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join(".lox_history"))
}

fn run_prompt(lox: &mut Lox) {
    let mut editor = DefaultEditor::new().expect("failed to initialize line editor");

    let history_path = history_path();
    if let Some(path) = &history_path {
        let _ = editor.load_history(path);
    }

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                if line.trim().is_empty() || line.trim() == "exit" {
                    break;
                }
                let _ = editor.add_history_entry(line.as_str());
                lox.run_line(&line);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error reading line: {err}");
                break;
            }
        }
    }

    if let Some(path) = &history_path {
        let _ = editor.save_history(path);
    }
}
