use crate::algorithms::Hierarchical;
use crate::logger;
use crate::routines::output::Reduction;
use crate::routines::settings::{self, Settings};
use crate::structs::mixture::GaussianMixture;

use eyre::Result;
use std::time::Instant;

/// Reduce `input` to at most `initial_guess.len()` components
///
/// Validates `settings` and runs the [Hierarchical] engine with them. Logging is
/// left to the caller, see [reduce_with_config] for a run that also installs the
/// log subscriber.
pub fn reduce(
    input: &GaussianMixture,
    initial_guess: GaussianMixture,
    settings: &Settings,
) -> Result<Reduction> {
    settings.validate()?;
    let now = Instant::now();

    let reduction = Hierarchical::new(input, initial_guess)?
        .with_settings(settings)
        .fit()?;

    tracing::info!(
        "Reduced {} components to {} in {} cycles ({:.2?})",
        input.len(),
        reduction.mixture().len(),
        reduction.cycles(),
        now.elapsed()
    );
    Ok(reduction)
}

/// Read settings from a TOML file, set up logging, and reduce `input`
pub fn reduce_with_config(
    input: &GaussianMixture,
    initial_guess: GaussianMixture,
    settings_path: &str,
) -> Result<Reduction> {
    let settings = settings::read(settings_path)?;
    logger::setup_log(&settings)?;
    tracing::info!("Starting gmreduce with settings from {}", settings_path);
    reduce(input, initial_guess, &settings)
}
