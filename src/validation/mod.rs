//! Statistical tests behind the diagnostic suite.
//!
//! Every test returns a result carrying a statistic and a p-value and
//! implements [`HypothesisTest`].
//!
//! # Example
//!
//! ```
//! use fpi_forecast::validation::{jarque_bera, ljung_box, HypothesisTest};
//!
//! let residuals = vec![0.1, -0.2, 0.15, -0.1, 0.05, -0.08, 0.12, -0.15, 0.1, -0.05];
//! let lb = ljung_box(&residuals, Some(3), 0).unwrap();
//! println!("{}: Q = {:.3}, p = {:.3}", lb.name(), lb.statistic(), lb.p_value());
//!
//! let jb = jarque_bera(&residuals).unwrap();
//! assert!(jb.p_value() > 0.0 && jb.p_value() <= 1.0);
//! ```

pub mod diagnostics;
pub mod heteroscedasticity;
pub mod normality;
pub mod stationarity;

pub use diagnostics::{run_diagnostics, DiagnosticConfig, DiagnosticReport, TestSummary};
pub use heteroscedasticity::{
    arch_test, engle_lm, mcleod_li, ArchReport, ArchStatistic, ArchTestResult,
};
pub use normality::{jarque_bera, JarqueBeraResult};
pub use residual_tests::{box_pierce, ljung_box, LjungBoxResult, Portmanteau};
pub use stationarity::{
    adf_test, kpss_test, ndiffs, stationarity_verdict, AdfRegression, CriticalValues, KpssType,
    StationarityResult, StationarityTest, StationarityVerdict,
};

/// Common surface of a frequentist test result.
pub trait HypothesisTest {
    /// Human-readable test name.
    fn name(&self) -> &str;

    /// Statement of the null hypothesis.
    fn null_hypothesis(&self) -> &str;

    fn statistic(&self) -> f64;

    fn p_value(&self) -> f64;

    /// Whether the null is rejected at significance `alpha`.
    fn rejects_null(&self, alpha: f64) -> bool {
        self.p_value() < alpha
    }
}
