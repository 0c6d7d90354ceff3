use emg_plot::synth::{parse_cli, write_csv_file};

fn main() {
    let (fout, cfg) = match parse_cli() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };
    emg_plot::init_tracing(false);
    if let Err(e) = write_csv_file(&fout, &cfg) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    println!(
        "wrote {} recordings x {} channels x {} samples to {}",
        cfg.recordings,
        cfg.channels,
        cfg.samples,
        fout.display()
    );
}
