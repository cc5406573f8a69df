//! `ContractsEngine`: ejecuta el pipeline de migraciones.
//!
//! Orden estrictamente secuencial: migraciones en el orden declarado, pasos
//! de cada migración en el orden declarado, un módulo a la vez. Cada
//! migración completada se persiste de inmediato en `migration.json`; las ya
//! completadas se saltan en corridas posteriores.

use chain_core::{run_checked, ContractsConfig, DeployError, DeployLayout, DeployResult, Invocation, MigrationStepConfig,
                 ModuleConfig, PortalStore, Runner, Validate, NETWORK_PORTAL_KEY};
use indexmap::IndexMap;
use tracing::{info, info_span, Instrument};

use crate::artifacts::ArtifactManager;
use crate::injector::PortalInjector;
use crate::run_args;
use crate::tracker::{MigrationStatus, MigrationStep, MigrationTracker};

/// Se resuelve en el PATH del proceso.
const TRUFFLE_BINARY: &str = "truffle";

/// Qué migraciones ejecutó y cuáles saltó una corrida.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub executed: Vec<String>,
    pub skipped: Vec<String>,
}

pub struct ContractsEngine<R: Runner> {
    net: String,
    config: ContractsConfig,
    layout: DeployLayout,
    artifacts: ArtifactManager,
    tracker: MigrationTracker,
    injector: PortalInjector,
    runner: R,
}

impl<R: Runner> ContractsEngine<R> {
    /// Valida la configuración y exige que el portal de contratos exista.
    pub fn new(config: ContractsConfig, net: impl Into<String>, layout: DeployLayout, runner: R) -> DeployResult<Self> {
        config.validate()?;
        let portal = PortalStore::open("contracts", &layout.contracts_portal)?;
        let engine = Self { net: net.into(),
                            artifacts: ArtifactManager::new(layout.clone()),
                            tracker: MigrationTracker::new(layout.clone()),
                            injector: PortalInjector::new(portal),
                            config,
                            layout,
                            runner };
        for line in engine.summary() {
            info!(network = %engine.net, "{line}");
        }
        Ok(engine)
    }

    /// Resumen legible: módulos y migraciones configurados.
    pub fn summary(&self) -> Vec<String> {
        let mut lines = vec![format!("{} module(s), {} migration(s), {} step(s) on network `{}`",
                                     self.config.modules.len(),
                                     self.config.migrations.len(),
                                     self.config.step_count(),
                                     self.net)];
        for m in &self.config.migrations {
            let modules: Vec<&str> = m.serie.iter().map(|s| s.module_name()).collect();
            lines.push(format!("  {} -> [{}]", m.name, modules.join(", ")));
        }
        lines
    }

    pub async fn run(&self) -> DeployResult<RunReport> {
        let span = info_span!("contracts", network = %self.net);
        self.run_inner().instrument(span).await
    }

    async fn run_inner(&self) -> DeployResult<RunReport> {
        // Hand-off explícito con el engine de red.
        let network = self.injector.portal().require(NETWORK_PORTAL_KEY)?;
        info!(network_id = %network["network_id"], "network entry found in contracts portal");

        let modules: IndexMap<&str, &ModuleConfig> = self.config.modules.iter().map(|m| (m.name.as_str(), m)).collect();
        let mut statuses = self.tracker.load(&self.net)?;
        let mut report = RunReport::default();

        for migration in &self.config.migrations {
            if MigrationTracker::is_complete(&statuses, &migration.name) {
                info!(migration = %migration.name, "already completed, skipping");
                report.skipped.push(migration.name.clone());
                continue;
            }

            info!(migration = %migration.name, steps = migration.serie.len(), "starting migration");
            let mut history = Vec::new();
            for step in &migration.serie {
                let module = modules.get(step.module_name()).copied().ok_or_else(|| {
                                 DeployError::config(format!("migrations.{}", migration.name),
                                                     format!("unknown module `{}`", step.module_name()))
                             })?;
                let span = info_span!("module", module = %module.name, migration = %migration.name);
                self.process_module(module, step, &migration.name).instrument(span).await?;

                history.extend(step.migration_numbers().map(|n| MigrationStep { name: module.name.clone(),
                                                                              args: step.args().cloned(),
                                                                              migration_number: n }));
            }

            statuses.push(MigrationStatus { name: migration.name.clone(),
                                            status: true,
                                            history });
            self.tracker.commit(&self.net, &statuses)?;
            info!(outcome = "success", migration = %migration.name, "migration completed");
            report.executed.push(migration.name.clone());
        }
        Ok(report)
    }

    /// Procesa un paso sobre un módulo: prepara el workspace, ejecuta truffle
    /// y archiva/publica el build resultante.
    pub async fn process_module(&self, module: &ModuleConfig, step: &MigrationStepConfig, migration: &str) -> DeployResult<()> {
        let name = module.name.as_str();
        info!(migration, "processing module");

        self.artifacts.clear_build(name)?;
        run_args::clear(&self.layout.contracts)?;
        if module.upgradeable {
            self.artifacts.clear_upgradeable_build(name)?;
        }

        if self.artifacts.check_build_exists(name, &self.net) {
            self.artifacts.recover_build(name, &self.net)?;
            if module.upgradeable {
                self.artifacts.recover_upgradeable_build(name, &self.net)?;
            }
            info!("previous build recovered");
        }

        if let Some(args) = step.args() {
            run_args::write(&self.layout.contracts, args)?;
        }

        let cwd = self.layout.module_dir(name);
        if !cwd.is_dir() {
            return Err(DeployError::Filesystem { path: cwd,
                                                 message: format!("module `{name}` directory not found") });
        }

        if step.runs_tests() {
            run_checked(&self.runner, &Invocation::new(TRUFFLE_BINARY, ["test"], &cwd)).await?;
        }

        let args: Vec<&str> = match step {
            MigrationStepConfig::Truffle(_) => vec!["migrate", "--network", self.net.as_str()],
            MigrationStepConfig::Script(s) => vec!["exec", s.method.as_str(), "--network", self.net.as_str()],
        };
        run_checked(&self.runner, &Invocation::new(TRUFFLE_BINARY, args, &cwd)).await?;

        self.artifacts.save_build(name, &self.net)?;
        if module.upgradeable {
            self.artifacts.save_upgradeable_build(name, &self.net)?;
        }

        self.injector.publish(&self.layout.module_build(name), name)?;
        Ok(())
    }

    /// Limpia las entradas de módulos del portal de contratos. `network.json`
    /// pertenece al engine de red y se conserva. Best-effort: sin entradas no
    /// es error.
    pub fn clean(&self) -> DeployResult<usize> {
        let removed = self.injector.portal().clean(&[NETWORK_PORTAL_KEY])?;
        info!(network = %self.net, removed, "contracts portal cleaned");
        Ok(removed)
    }
}
