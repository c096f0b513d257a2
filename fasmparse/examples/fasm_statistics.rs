use fasmparse::Fasm;
use std::env;

fn main() {
    clilog::init_stderr_color_debug();
    let args: Vec<String> = env::args().collect();
    assert!(args.len() == 2,
            "Usage: {} <fasm_path>", args[0]);
    clilog::info!("FASM file {}", args[1]);

    let fasm = match Fasm::parse_file(&args[1]) {
        Ok(fasm) => fasm,
        Err(e) => panic!("{}", e)
    };

    clilog::info!("# Lines = {}", fasm.lines.len());
    clilog::info!("# Features = {}", fasm.lines.iter()
                  .filter(|l| l.set_feature.is_some()).count());
    clilog::info!("# Annotations = {}", fasm.lines.iter()
                  .filter_map(|l| l.annotations.as_ref().map(|a| a.len()))
                  .sum::<usize>());
    clilog::info!("# Comments = {}", fasm.lines.iter()
                  .filter(|l| l.comment.is_some()).count());
}
