use super::{CommandResult, Invocation, Reply};
use crate::error::CommandError;
use crate::scheduler::{CurfewEnforcer, CurfewWindow};
use crate::warden::Warden;

impl Warden {
    /// `curfew start` uses the configured window; `curfew start HH:MM HH:MM`
    /// overrides it for this run.
    pub(super) async fn cmd_curfew_start(&self, inv: &Invocation<'_>) -> CommandResult {
        let window = match inv.args.as_slice() {
            [] => self
                .config
                .curfew
                .window()
                .map_err(|e| CommandError::parse(e.to_string()))?,
            [start, end] => CurfewWindow::parse(start, end)
                .map_err(|_| CommandError::parse("Times must look like HH:MM"))?,
            _ => return Err(CommandError::parse("Usage: curfew start [HH:MM HH:MM]")),
        };

        let enforcer = CurfewEnforcer::new(inv.group(), window, self.platform.clone(), self.clock.clone())
            .with_interval(self.config.curfew.poll_interval());
        self.scheduler
            .start(inv.group(), move |token| enforcer.run(token))?;

        Ok(vec![Reply::text(format!("Curfew started for {window}"))])
    }

    pub(super) async fn cmd_curfew_stop(&self, inv: &Invocation<'_>) -> CommandResult {
        self.scheduler.stop(inv.group()).await?;
        Ok(vec![Reply::text("Curfew stopped")])
    }
}
