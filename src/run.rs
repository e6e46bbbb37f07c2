use itertools::Itertools;
use rayon::prelude::*;
use tracing::{error, info};

use crate::{
    result::{Results, RunResult},
    settings::Settings,
    sim::{evaluate, Method},
};

/// the outcome of evaluating every configured method
#[derive(Debug, Default)]
pub struct MethodRuns {
    /// sorted by score, best first
    pub results: Results,
    pub ok_list: Vec<String>,
    pub err_list: Vec<String>,
}

/// evaluate one method against its own snapshot of the settings
pub fn run_method(settings: &Settings, method: &Method) -> eyre::Result<RunResult> {
    evaluate(&settings.arch, method, &settings.workload)
}

/// evaluate all methods in parallel, a failing method does not stop the others
pub fn run_methods(settings: &Settings) -> MethodRuns {
    let outcomes = settings
        .methods
        .par_iter()
        .map(|method| (method.name.clone(), run_method(settings, method)))
        .collect::<Vec<_>>();

    let mut runs = MethodRuns::default();
    for (name, outcome) in outcomes {
        match outcome {
            Ok(result) => {
                info!("finished method: {}", name);
                runs.results.all.push(result);
                runs.ok_list.push(name);
            }
            Err(e) => {
                error!("method {} failed: {:?}", name, e);
                runs.err_list.push(name);
            }
        }
    }
    runs.results.sort_by_score();
    info!(
        "methods ranked: {}",
        runs.results.all.iter().map(|r| &r.method).join(" > ")
    );
    runs
}
