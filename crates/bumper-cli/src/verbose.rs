use bumper::logging::Verbosity;

/// Prints user facing output to stdout.
pub(crate) struct Logger {
    verbosity: Verbosity,
}

impl Logger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

impl bumper::logging::Log for Logger {
    fn log(&self, verbosity: Verbosity, message: &str) {
        if verbosity <= self.verbosity && verbosity > Verbosity::Off {
            println!("{message}");
        }
    }
}
