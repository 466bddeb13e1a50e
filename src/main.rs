use deploy_status::ReportError;

fn main() {
    // Delegate to CLI runner; the exit code reflects the failure kind.
    if let Err(err) = deploy_status::cli::run() {
        eprintln!("error: {err:#}");
        let code = err
            .downcast_ref::<ReportError>()
            .map_or(1, ReportError::exit_code);
        std::process::exit(code);
    }
}
