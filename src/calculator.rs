// 🧮 Numeric Calculator - age, weight lost, percentage lost
//
// Local formulas are always available. An external calculator program can be
// configured in front of them; any failure on its side (missing program,
// timeout, non-zero exit, unparseable stdout) falls through to the local
// formula without surfacing an error.
//
// Process protocol:
//   <program> age <YYYY-MM-DD>
//   <program> weight_lost <starting> <current>
//   <program> percentage_lost <weight_lost> <starting>
// The result is the trimmed stdout.

use crate::contestant::DATE_FORMAT;
use chrono::{Datelike, NaiveDate};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default bounded wait per external invocation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// CALCULATOR TRAIT
// ============================================================================

/// A source of the three derived values. `None` means "no result".
pub trait Calculator: Send + Sync {
    fn name(&self) -> &str;

    fn age(&self, date_of_birth: NaiveDate, today: NaiveDate) -> Option<u32>;

    fn weight_lost(&self, starting_weight: f64, current_weight: f64) -> Option<f64>;

    fn percentage_lost(&self, weight_lost: f64, starting_weight: f64) -> Option<f64>;
}

// ============================================================================
// LOCAL FORMULAS
// ============================================================================

/// Whole years elapsed; a birthday not yet reached this year subtracts one
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

pub fn weight_lost(starting_weight: f64, current_weight: f64) -> f64 {
    starting_weight - current_weight
}

/// Zero when there is no positive baseline
pub fn percentage_lost(weight_lost: f64, starting_weight: f64) -> f64 {
    if starting_weight <= 0.0 {
        return 0.0;
    }
    weight_lost / starting_weight * 100.0
}

/// In-process formulas; never returns `None`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCalculator;

impl Calculator for LocalCalculator {
    fn name(&self) -> &str {
        "local"
    }

    fn age(&self, date_of_birth: NaiveDate, today: NaiveDate) -> Option<u32> {
        Some(age_on(date_of_birth, today))
    }

    fn weight_lost(&self, starting_weight: f64, current_weight: f64) -> Option<f64> {
        Some(weight_lost(starting_weight, current_weight))
    }

    fn percentage_lost(&self, weight_lost: f64, starting_weight: f64) -> Option<f64> {
        Some(percentage_lost(weight_lost, starting_weight))
    }
}

// ============================================================================
// EXTERNAL PROCESS CALCULATOR
// ============================================================================

/// Runs an external calculator program once per computation
#[derive(Debug, Clone)]
pub struct ProcessCalculator {
    program: PathBuf,
    leading_args: Vec<String>,
    timeout: Duration,
}

impl ProcessCalculator {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        ProcessCalculator {
            program: program.into(),
            leading_args: Vec::new(),
            timeout,
        }
    }

    /// Only returns a calculator when the program file exists
    pub fn locate(program: &Path, timeout: Duration) -> Option<Self> {
        if program.is_file() {
            Some(Self::new(program, timeout))
        } else {
            None
        }
    }

    /// Arguments placed before the operation name (e.g. an interpreter script)
    pub fn with_leading_args(mut self, args: Vec<String>) -> Self {
        self.leading_args = args;
        self
    }

    /// Invoke `<program> <operation> <args...>` and return trimmed stdout on success
    fn invoke(&self, operation: &str, args: &[String]) -> Option<String> {
        debug!(program = %self.program.display(), operation, ?args, "invoking calculator");

        let mut child = match Command::new(&self.program)
            .args(&self.leading_args)
            .arg(operation)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!(program = %self.program.display(), error = %e, "calculator failed to start");
                return None;
            }
        };

        // Drain stdout while waiting so a chatty program cannot stall on a full pipe
        let reader = child.stdout.take().map(|mut stdout| {
            thread::spawn(move || {
                let mut output = String::new();
                stdout.read_to_string(&mut output).map(|_| output)
            })
        });

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if started.elapsed() >= self.timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        warn!(
                            operation,
                            timeout_ms = self.timeout.as_millis() as u64,
                            "calculator timed out"
                        );
                        return None;
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    warn!(operation, error = %e, "failed waiting for calculator");
                    let _ = child.kill();
                    return None;
                }
            }
        };

        if !status.success() {
            debug!(operation, %status, "calculator exited unsuccessfully");
            return None;
        }

        let stdout = reader?.join().ok()?.ok()?;
        Some(stdout.trim().to_string())
    }

    fn invoke_f64(&self, operation: &str, args: &[String]) -> Option<f64> {
        let raw = self.invoke(operation, args)?;
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                debug!(operation, output = %raw, "unparseable calculator output");
                None
            }
        }
    }
}

impl Calculator for ProcessCalculator {
    fn name(&self) -> &str {
        "process"
    }

    fn age(&self, date_of_birth: NaiveDate, _today: NaiveDate) -> Option<u32> {
        let raw = self.invoke("age", &[date_of_birth.format(DATE_FORMAT).to_string()])?;
        // Negative ages are not results
        match raw.parse::<i64>() {
            Ok(v) => u32::try_from(v).ok(),
            Err(_) => {
                debug!(output = %raw, "unparseable calculator age");
                None
            }
        }
    }

    fn weight_lost(&self, starting_weight: f64, current_weight: f64) -> Option<f64> {
        self.invoke_f64(
            "weight_lost",
            &[starting_weight.to_string(), current_weight.to_string()],
        )
    }

    fn percentage_lost(&self, weight_lost: f64, starting_weight: f64) -> Option<f64> {
        self.invoke_f64(
            "percentage_lost",
            &[weight_lost.to_string(), starting_weight.to_string()],
        )
    }
}

// ============================================================================
// FALLBACK CHAIN
// ============================================================================

/// Preferred calculator with the local formulas behind it
///
/// Every method is infallible: a missing result from the preferred calculator
/// is replaced by the local formula.
pub struct Calculations {
    preferred: Option<Box<dyn Calculator>>,
}

impl Calculations {
    pub fn local() -> Self {
        Calculations { preferred: None }
    }

    pub fn with_preferred(calculator: impl Calculator + 'static) -> Self {
        Calculations {
            preferred: Some(Box::new(calculator)),
        }
    }

    /// Name of the calculator tried first
    pub fn preferred_name(&self) -> &str {
        self.preferred
            .as_ref()
            .map(|c| c.name())
            .unwrap_or_else(|| LocalCalculator.name())
    }

    pub fn age(&self, date_of_birth: NaiveDate, today: NaiveDate) -> u32 {
        self.preferred
            .as_ref()
            .and_then(|c| c.age(date_of_birth, today))
            .unwrap_or_else(|| age_on(date_of_birth, today))
    }

    pub fn weight_lost(&self, starting_weight: f64, current_weight: f64) -> f64 {
        self.preferred
            .as_ref()
            .and_then(|c| c.weight_lost(starting_weight, current_weight))
            .unwrap_or_else(|| weight_lost(starting_weight, current_weight))
    }

    pub fn percentage_lost(&self, weight_lost: f64, starting_weight: f64) -> f64 {
        self.preferred
            .as_ref()
            .and_then(|c| c.percentage_lost(weight_lost, starting_weight))
            .unwrap_or_else(|| percentage_lost(weight_lost, starting_weight))
    }
}

impl Default for Calculations {
    fn default() -> Self {
        Self::local()
    }
}

impl std::fmt::Debug for Calculations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Calculations")
            .field("preferred", &self.preferred_name())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Always answers with fixed values
    struct Fixed;

    impl Calculator for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn age(&self, _: NaiveDate, _: NaiveDate) -> Option<u32> {
            Some(7)
        }
        fn weight_lost(&self, _: f64, _: f64) -> Option<f64> {
            Some(1.0)
        }
        fn percentage_lost(&self, _: f64, _: f64) -> Option<f64> {
            None
        }
    }

    #[test]
    fn test_age_on_birthday_boundaries() {
        let today = date(2026, 10, 19);

        assert_eq!(age_on(date(1990, 1, 1), today), 36);
        assert_eq!(age_on(date(1990, 10, 19), today), 36); // birthday today
        assert_eq!(age_on(date(1990, 10, 20), today), 35); // birthday tomorrow
        assert_eq!(age_on(date(2026, 10, 19), today), 0);
    }

    #[test]
    fn test_age_on_leap_day_birthday() {
        assert_eq!(age_on(date(2000, 2, 29), date(2026, 2, 28)), 25);
        assert_eq!(age_on(date(2000, 2, 29), date(2026, 3, 1)), 26);
    }

    #[test]
    fn test_local_weight_formulas() {
        assert_eq!(weight_lost(200.0, 180.0), 20.0);
        assert_eq!(weight_lost(150.0, 180.0), -30.0);
        assert_eq!(percentage_lost(20.0, 200.0), 10.0);
        assert_eq!(percentage_lost(-30.0, 150.0), -20.0);
        assert_eq!(percentage_lost(5.0, 0.0), 0.0);
        assert_eq!(percentage_lost(5.0, -10.0), 0.0);
    }

    #[test]
    fn test_calculations_local_only() {
        let calc = Calculations::local();

        assert_eq!(calc.preferred_name(), "local");
        assert_eq!(calc.age(date(1990, 1, 1), date(2026, 10, 19)), 36);
        assert_eq!(calc.weight_lost(200.0, 180.0), 20.0);
        assert_eq!(calc.percentage_lost(20.0, 200.0), 10.0);
    }

    #[test]
    fn test_calculations_prefer_then_fall_back() {
        let calc = Calculations::with_preferred(Fixed);

        assert_eq!(calc.preferred_name(), "fixed");
        assert_eq!(calc.age(date(1990, 1, 1), date(2026, 10, 19)), 7);
        assert_eq!(calc.weight_lost(200.0, 180.0), 1.0);
        // Fixed has no percentage result -> local formula
        assert_eq!(calc.percentage_lost(20.0, 200.0), 10.0);
    }

    #[test]
    fn test_missing_program_is_not_located() {
        let missing = Path::new("/definitely/not/a/calculator");
        assert!(ProcessCalculator::locate(missing, DEFAULT_TIMEOUT).is_none());
    }

    #[test]
    fn test_unstartable_program_falls_back() {
        let calc = Calculations::with_preferred(ProcessCalculator::new(
            "/definitely/not/a/calculator",
            Duration::from_millis(200),
        ));

        assert_eq!(calc.weight_lost(200.0, 180.0), 20.0);
        assert_eq!(calc.age(date(1990, 1, 1), date(2026, 10, 19)), 36);
    }

    // ========================================================================
    // PROCESS PROTOCOL (runs a shell script through /bin/sh -c)
    // ========================================================================

    #[cfg(unix)]
    fn sh_calculator(script: &str, timeout: Duration) -> ProcessCalculator {
        ProcessCalculator::new("/bin/sh", timeout).with_leading_args(vec![
            "-c".to_string(),
            script.to_string(),
            "calculator".to_string(),
        ])
    }

    #[cfg(unix)]
    #[test]
    fn test_process_results_are_used() {
        let script = r#"case "$1" in
            age) echo 99 ;;
            weight_lost) echo "  12.5 " ;;
            percentage_lost) echo garbage ;;
        esac"#;
        let process = sh_calculator(script, Duration::from_secs(5));

        assert_eq!(process.age(date(1990, 1, 1), date(2026, 10, 19)), Some(99));
        assert_eq!(process.weight_lost(200.0, 180.0), Some(12.5));
        assert_eq!(process.percentage_lost(20.0, 200.0), None);

        let calc = Calculations::with_preferred(process);
        assert_eq!(calc.percentage_lost(20.0, 200.0), 10.0);
    }

    #[cfg(unix)]
    #[test]
    fn test_process_receives_arguments() {
        // Echo back the first argument after the operation
        let process = sh_calculator(r#"echo "$2""#, Duration::from_secs(5));

        assert_eq!(process.weight_lost(200.5, 180.0), Some(200.5));
        assert_eq!(process.percentage_lost(20.0, 200.0), Some(20.0));
    }

    #[cfg(unix)]
    #[test]
    fn test_negative_process_age_is_no_result() {
        let process = sh_calculator("echo -3", Duration::from_secs(5));
        assert_eq!(process.age(date(1990, 1, 1), date(2026, 10, 19)), None);

        let calc = Calculations::with_preferred(process);
        assert_eq!(calc.age(date(1990, 1, 1), date(2026, 10, 19)), 36);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_no_result() {
        let process = sh_calculator("echo 5; exit 3", Duration::from_secs(5));
        assert_eq!(process.weight_lost(200.0, 180.0), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_output_larger_than_pipe_buffer() {
        let script = r#"head -c 200000 /dev/zero | tr '\0' ' '; echo 7"#;
        let process = sh_calculator(script, Duration::from_secs(5));

        let started = Instant::now();
        assert_eq!(process.weight_lost(200.0, 180.0), Some(7.0));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_is_no_result() {
        let process = sh_calculator("sleep 5; echo 1", Duration::from_millis(100));

        let started = Instant::now();
        let calc = Calculations::with_preferred(process);
        assert_eq!(calc.weight_lost(200.0, 180.0), 20.0);
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
