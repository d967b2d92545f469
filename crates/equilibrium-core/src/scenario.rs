// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Scenario
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! A complete solve setup read from one JSON scenario file.

use crate::equilibrium::EquilibriumState;
use crate::picard::{self, PicardConfig, PicardObserver, SolveError};
use equilibrium_types::config::EquilibriumConfig;
use equilibrium_types::error::EquilibriumResult;
use equilibrium_types::targets::ControlTargets;
use log::info;

/// Empty state, shape targets and solver options of one scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub state: EquilibriumState,
    pub targets: ControlTargets,
    pub config: PicardConfig,
}

impl Scenario {
    pub fn from_config(config: &EquilibriumConfig) -> EquilibriumResult<Self> {
        config.solver.validate()?;
        let state = EquilibriumState::from_config(config)?;
        for (r, z) in config.targets.points() {
            state.grid().check_contains(r, z)?;
        }
        info!(
            "scenario '{}': {}x{} grid, {} coils, {} target equations",
            config.name,
            config.grid_resolution[0],
            config.grid_resolution[1],
            state.device.coils.len(),
            config.targets.equation_count()
        );
        Ok(Scenario {
            name: config.name.clone(),
            state,
            targets: config.targets.clone(),
            config: PicardConfig::new(config.solver.clone()),
        })
    }

    pub fn from_file(path: &str) -> EquilibriumResult<Self> {
        let config = EquilibriumConfig::from_file(path)?;
        Self::from_config(&config)
    }

    /// Run the Picard solve from the scenario's empty state.
    pub fn solve(&self) -> Result<EquilibriumState, SolveError> {
        picard::solve(
            self.state.clone(),
            &self.state.profile,
            &self.targets,
            &self.config,
        )
    }

    pub fn solve_with_observer<O: PicardObserver + ?Sized>(
        &self,
        observer: &mut O,
    ) -> Result<EquilibriumState, SolveError> {
        picard::solve_with_observer(
            self.state.clone(),
            &self.state.profile,
            &self.targets,
            &self.config,
            observer,
        )
    }
}
