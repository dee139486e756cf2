use indicatif::{ProgressBar, ProgressStyle};

/// Shows how many scenarios of the suite have run.
pub struct SuiteProgress {
    pb: ProgressBar,
}

impl SuiteProgress {
    pub fn new(scenario_count: usize) -> Self {
        let pb = ProgressBar::new(scenario_count as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{wide_bar:.cyan/blue}] {pos}/{len} scenarios [{elapsed_precise}] {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        Self { pb }
    }

    /// For CI, where nobody is watching the bar.
    pub fn hidden() -> Self {
        Self {
            pb: ProgressBar::hidden(),
        }
    }

    pub(crate) fn start(&self, scenario_name: &str) {
        self.pb.set_message(scenario_name.to_string());
    }

    pub(crate) fn advance(&self) {
        self.pb.inc(1);
    }

    pub(crate) fn finish(&self) {
        self.pb.finish_and_clear();
    }

    /// Print a line without tearing the bar.
    pub(crate) fn println(&self, line: impl AsRef<str>) {
        if self.pb.is_hidden() {
            println!("{}", line.as_ref());
        } else {
            self.pb.println(line);
        }
    }
}
