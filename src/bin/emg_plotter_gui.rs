fn main() {
    emg_plot::init_tracing(false);
    if let Err(e) = emg_plot::gui::run() {
        eprintln!("Error: failed to run the EMG plotter window: {}", e);
        std::process::exit(1);
    }
}
