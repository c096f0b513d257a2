use fasmparse::{ fasm_to_string, Fasm };
use std::env;
use std::process::exit;

fn usage() -> ! {
    clilog::error!("Usage: fasm [--canonical] FILE");
    exit(2);
}

fn main() {
    clilog::init_stderr_color_debug();

    let mut canonical = false;
    let mut file = None;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--canonical" => canonical = true,
            a if a.starts_with('-') => usage(),
            _ if file.is_none() => file = Some(arg),
            _ => usage(),
        }
    }
    let file = match file {
        Some(file) => file,
        None => usage(),
    };

    let fasm = match Fasm::parse_file(&file) {
        Ok(fasm) => fasm,
        Err(e) => {
            clilog::error!("{}: {}", file, e);
            exit(1);
        }
    };
    print!("{}", fasm_to_string(&fasm.lines, canonical));
}
