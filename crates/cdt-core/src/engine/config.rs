use crate::core::math::BisectionOptions;
use crate::core::thermo::carriers::EffectiveMass;
use thiserror::Error;

/// Default energy range in eV integrated into each band for the carrier densities.
pub const DEFAULT_INTEGRATION_WINDOW: f64 = 5.0;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Band parameters used to evaluate free-carrier densities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarrierConfig {
    pub electron_mass: EffectiveMass,
    pub hole_mass: EffectiveMass,
    /// Energy range in eV integrated from each band edge into the band.
    pub integration_window: f64,
}

/// Stopping rules for the Fermi-level bisection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    pub tolerance: f64,
    pub relative_tolerance: f64,
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        let defaults = BisectionOptions::default();
        Self {
            tolerance: defaults.tolerance,
            relative_tolerance: defaults.relative_tolerance,
            max_iterations: defaults.max_iterations,
        }
    }
}

impl From<&SolverConfig> for BisectionOptions {
    fn from(config: &SolverConfig) -> Self {
        Self {
            tolerance: config.tolerance,
            relative_tolerance: config.relative_tolerance,
            max_iterations: config.max_iterations,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquilibriumConfig {
    /// Temperature in K.
    pub temperature: f64,
    pub carriers: CarrierConfig,
    pub solver: SolverConfig,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuenchConfig {
    /// Temperature in K at which defects equilibrate and are then frozen in.
    pub synthesis_temperature: f64,
    /// Operating temperature in K at which only charge states and carriers re-equilibrate.
    pub temperature: f64,
    pub carriers: CarrierConfig,
    pub solver: SolverConfig,
}

/// Settings shared by both builders.
#[derive(Default)]
struct CommonSettings {
    electron_mass: Option<EffectiveMass>,
    hole_mass: Option<EffectiveMass>,
    integration_window: Option<f64>,
    solver: Option<SolverConfig>,
}

impl CommonSettings {
    fn build(self) -> Result<(CarrierConfig, SolverConfig), ConfigError> {
        let integration_window = self.integration_window.unwrap_or(DEFAULT_INTEGRATION_WINDOW);
        if !(integration_window.is_finite() && integration_window > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "integration_window",
                reason: format!("must be positive, got {}", integration_window),
            });
        }
        let carriers = CarrierConfig {
            electron_mass: self
                .electron_mass
                .ok_or(ConfigError::MissingParameter("electron_mass"))?,
            hole_mass: self
                .hole_mass
                .ok_or(ConfigError::MissingParameter("hole_mass"))?,
            integration_window,
        };
        let solver = self.solver.unwrap_or_default();
        validate_solver(&solver)?;
        Ok((carriers, solver))
    }
}

fn validate_temperature(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("must be a positive temperature in K, got {}", value),
        })
    }
}

fn validate_solver(solver: &SolverConfig) -> Result<(), ConfigError> {
    if !(solver.tolerance.is_finite() && solver.tolerance > 0.0) {
        return Err(ConfigError::InvalidParameter {
            name: "tolerance",
            reason: format!("must be positive, got {}", solver.tolerance),
        });
    }
    if !(solver.relative_tolerance.is_finite() && solver.relative_tolerance >= 0.0) {
        return Err(ConfigError::InvalidParameter {
            name: "relative_tolerance",
            reason: format!("must be non-negative, got {}", solver.relative_tolerance),
        });
    }
    if solver.max_iterations == 0 {
        return Err(ConfigError::InvalidParameter {
            name: "max_iterations",
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

#[derive(Default)]
pub struct EquilibriumConfigBuilder {
    temperature: Option<f64>,
    common: CommonSettings,
}

impl EquilibriumConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, kelvin: f64) -> Self {
        self.temperature = Some(kelvin);
        self
    }
    pub fn electron_mass(mut self, mass: EffectiveMass) -> Self {
        self.common.electron_mass = Some(mass);
        self
    }
    pub fn hole_mass(mut self, mass: EffectiveMass) -> Self {
        self.common.hole_mass = Some(mass);
        self
    }
    pub fn integration_window(mut self, window: f64) -> Self {
        self.common.integration_window = Some(window);
        self
    }
    pub fn solver(mut self, solver: SolverConfig) -> Self {
        self.common.solver = Some(solver);
        self
    }

    pub fn build(self) -> Result<EquilibriumConfig, ConfigError> {
        let temperature = validate_temperature(
            "temperature",
            self.temperature
                .ok_or(ConfigError::MissingParameter("temperature"))?,
        )?;
        let (carriers, solver) = self.common.build()?;
        Ok(EquilibriumConfig {
            temperature,
            carriers,
            solver,
        })
    }
}

#[derive(Default)]
pub struct QuenchConfigBuilder {
    synthesis_temperature: Option<f64>,
    temperature: Option<f64>,
    common: CommonSettings,
}

impl QuenchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn synthesis_temperature(mut self, kelvin: f64) -> Self {
        self.synthesis_temperature = Some(kelvin);
        self
    }
    pub fn temperature(mut self, kelvin: f64) -> Self {
        self.temperature = Some(kelvin);
        self
    }
    pub fn electron_mass(mut self, mass: EffectiveMass) -> Self {
        self.common.electron_mass = Some(mass);
        self
    }
    pub fn hole_mass(mut self, mass: EffectiveMass) -> Self {
        self.common.hole_mass = Some(mass);
        self
    }
    pub fn integration_window(mut self, window: f64) -> Self {
        self.common.integration_window = Some(window);
        self
    }
    pub fn solver(mut self, solver: SolverConfig) -> Self {
        self.common.solver = Some(solver);
        self
    }

    pub fn build(self) -> Result<QuenchConfig, ConfigError> {
        let synthesis_temperature = validate_temperature(
            "synthesis_temperature",
            self.synthesis_temperature
                .ok_or(ConfigError::MissingParameter("synthesis_temperature"))?,
        )?;
        let temperature = validate_temperature(
            "temperature",
            self.temperature
                .ok_or(ConfigError::MissingParameter("temperature"))?,
        )?;
        let (carriers, solver) = self.common.build()?;
        Ok(QuenchConfig {
            synthesis_temperature,
            temperature,
            carriers,
            solver,
        })
    }
}

impl QuenchConfig {
    /// The equilibrium problem solved at the synthesis temperature.
    pub fn synthesis_stage(&self) -> EquilibriumConfig {
        EquilibriumConfig {
            temperature: self.synthesis_temperature,
            carriers: self.carriers,
            solver: self.solver,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mass(m: f64) -> EffectiveMass {
        EffectiveMass::isotropic(m).unwrap()
    }

    #[test]
    fn equilibrium_builder_fills_defaults() {
        let config = EquilibriumConfigBuilder::new()
            .temperature(300.0)
            .electron_mass(mass(0.3))
            .hole_mass(mass(0.6))
            .build()
            .unwrap();
        assert_eq!(config.carriers.integration_window, DEFAULT_INTEGRATION_WINDOW);
        assert_eq!(config.solver, SolverConfig::default());
        assert_eq!(config.solver.max_iterations, 100);
    }

    #[test]
    fn missing_masses_are_reported() {
        let err = EquilibriumConfigBuilder::new()
            .temperature(300.0)
            .hole_mass(mass(0.6))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("electron_mass"));
    }

    #[test]
    fn missing_temperature_is_reported_first() {
        let err = EquilibriumConfigBuilder::new().build().unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("temperature"));
    }

    #[test]
    fn negative_temperature_is_invalid() {
        let err = QuenchConfigBuilder::new()
            .synthesis_temperature(-10.0)
            .temperature(300.0)
            .electron_mass(mass(1.0))
            .hole_mass(mass(1.0))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameter { name: "synthesis_temperature", .. }));
    }

    #[test]
    fn zero_iterations_are_invalid() {
        let err = EquilibriumConfigBuilder::new()
            .temperature(300.0)
            .electron_mass(mass(1.0))
            .hole_mass(mass(1.0))
            .solver(SolverConfig {
                max_iterations: 0,
                ..Default::default()
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameter { name: "max_iterations", .. }));
    }

    #[test]
    fn synthesis_stage_uses_synthesis_temperature() {
        let config = QuenchConfigBuilder::new()
            .synthesis_temperature(1200.0)
            .temperature(300.0)
            .electron_mass(mass(0.3))
            .hole_mass(mass(0.6))
            .integration_window(3.0)
            .build()
            .unwrap();
        let stage = config.synthesis_stage();
        assert_eq!(stage.temperature, 1200.0);
        assert_eq!(stage.carriers.integration_window, 3.0);
    }
}
