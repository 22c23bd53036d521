use anyhow::{anyhow, Error, Result};
use log::{debug, error, warn};
use once_cell::sync::OnceCell;
use rayon::ThreadPoolBuilder;

static GLOBAL_RAYON_THREADS: OnceCell<usize> = OnceCell::new();

/// Validate and normalize a requested CPU count.
pub fn determine_allowed_cpus(desired: usize) -> Result<usize> {
    if desired == 0 {
        error!("Must select > 0 threads");
        Err(Error::msg("Too few threads selected. Min 1"))
    } else if desired > num_cpus::get() {
        warn!(
            "Specified more threads ({}) than are available ({})",
            desired,
            num_cpus::get()
        );
        Ok(desired)
    } else {
        Ok(desired)
    }
}

/// Configure the global Rayon thread pool exactly once, returning the active
/// worker count. Later calls reuse the first pool and warn when the requested
/// size differs.
pub fn configure_global_thread_pool(threads: usize) -> Result<usize> {
    let requested = determine_allowed_cpus(threads)?;

    if let Some(active) = GLOBAL_RAYON_THREADS.get() {
        if *active != requested {
            warn!(
                "Rayon global thread pool already initialised with {} threads; ignoring request for {}",
                active, requested
            );
        }
        return Ok(*active);
    }

    match ThreadPoolBuilder::new().num_threads(requested).build_global() {
        Ok(_) => {
            GLOBAL_RAYON_THREADS
                .set(requested)
                .map_err(|_| anyhow!("Failed to record global Rayon thread count"))?;
            Ok(requested)
        }
        Err(err) => {
            debug!("Global Rayon thread pool initialisation skipped: {}", err);
            let fallback = rayon::current_num_threads();
            GLOBAL_RAYON_THREADS.set(fallback).ok();
            Ok(fallback)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_threads_rejected() {
        assert!(determine_allowed_cpus(0).is_err());
    }

    #[test]
    fn oversubscription_allowed() {
        let many = num_cpus::get() + 4;
        assert_eq!(determine_allowed_cpus(many).unwrap(), many);
    }
}
