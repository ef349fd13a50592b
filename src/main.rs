use std::io::{self, BufRead, IsTerminal, Read, Write};

use log::debug;

use minilisp::error::LispResult;
use minilisp::eval::{Machine, DEFAULT_HEAP_CAPACITY, DEFAULT_MAX_DEPTH};
use minilisp::reader;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    let mut load_files: Vec<String> = Vec::new();
    let mut max_depth = DEFAULT_MAX_DEPTH;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--load" => {
                if i + 1 < args.len() {
                    load_files.push(args[i + 1].clone());
                    i += 2;
                } else {
                    eprintln!("--load requires a file path");
                    std::process::exit(1);
                }
            }
            "--max-depth" => {
                if i + 1 < args.len() {
                    match args[i + 1].parse::<u32>() {
                        Ok(n) if n > 0 => max_depth = n,
                        _ => {
                            eprintln!("--max-depth requires a positive integer");
                            std::process::exit(1);
                        }
                    }
                    i += 2;
                } else {
                    eprintln!("--max-depth requires a positive integer");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                println!("Usage: minilisp [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --load <file>     Evaluate a source file before starting the REPL");
                println!("  --max-depth <n>   Evaluation nesting depth limit (default {})", DEFAULT_MAX_DEPTH);
                println!("  --help, -h        Show this help message");
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("Try 'minilisp --help' for usage information.");
                std::process::exit(1);
            }
        }
    }

    let mut machine = match Machine::new(DEFAULT_HEAP_CAPACITY, max_depth) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Failed to initialize machine: {}", e);
            std::process::exit(1);
        }
    };

    for path in &load_files {
        load_file(&mut machine, path);
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        run_interactive(&mut machine);
    } else {
        run_piped(&mut machine);
    }
}

/// Evaluate every expression in a source file. Any failure aborts.
fn load_file(machine: &mut Machine, path: &str) {
    let input = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading {}: {}", path, e);
            std::process::exit(1);
        }
    };

    let count = match eval_chunk(&input, machine) {
        Ok(count) => count,
        Err(e) => {
            eprintln!("Error in {}: {}", path, e);
            std::process::exit(1);
        }
    };
    debug!(
        "loaded {}: {} expressions, {} symbols interned, {} cells",
        path,
        count,
        machine.symbols.count(),
        machine.heap.total_cells()
    );
}

/// Read and evaluate all expressions in a chunk, counting them.
fn eval_chunk(input: &str, machine: &mut Machine) -> LispResult<usize> {
    let mut pos = 0;
    let mut count = 0;
    while let Some((expr, next)) =
        reader::read_one_at(input, pos, &mut machine.heap, &mut machine.symbols)?
    {
        pos = next;
        count += 1;
        machine.eval(expr)?;
    }
    Ok(count)
}

/// Interactive REPL: accumulate lines until parens are balanced.
fn run_interactive(machine: &mut Machine) {
    let stdin = io::stdin();
    let mut buf = String::new();
    let mut depth: i32 = 0;

    loop {
        if depth == 0 {
            print!("> ");
        } else {
            print!("  ");
        }
        io::stdout().flush().unwrap();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("Read error: {}", e);
                break;
            }
        }

        // Track paren depth (naive but sufficient for well-formed input)
        for ch in line.chars() {
            match ch {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
        }

        buf.push_str(&line);

        if depth <= 0 {
            depth = 0;
            let input = buf.trim().to_string();
            buf.clear();

            if input.is_empty() {
                continue;
            }

            eval_and_print(&input, machine);
        }
    }
}

/// Piped mode: read all input, then parse and evaluate one expression
/// at a time, printing each result.
fn run_piped(machine: &mut Machine) {
    let mut input = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut input) {
        eprintln!("Read error: {}", e);
        return;
    }
    eval_and_print(input.trim(), machine);
}

/// Evaluate one or more expressions in a string and print results.
/// Failures print as `<error: message>` and do not stop the session.
fn eval_and_print(input: &str, machine: &mut Machine) {
    let mut pos = 0;
    loop {
        match reader::read_one_at(input, pos, &mut machine.heap, &mut machine.symbols) {
            Ok(Some((expr, new_pos))) => {
                pos = new_pos;
                match machine.eval(expr) {
                    Ok(val) => println!("{}", machine.render(val)),
                    Err(e) => println!("<error: {}>", e),
                }
            }
            Ok(None) => break,
            Err(e) => {
                println!("<error: {}>", e);
                break;
            }
        }
    }
}
