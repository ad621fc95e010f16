use super::signal::CombatSignal;
use crate::combat::Combat;

/// Trait for systems that react to combat signals.
/// Implement this for logs, notifications, front-end refresh, etc.
pub trait SignalHandler {
    /// Handle a single signal with the combat state after the change.
    fn handle_signal(&mut self, signal: &CombatSignal, combat: Option<&Combat>);

    /// Handle multiple signals (default implementation calls handle_signal for each)
    fn handle_signals(&mut self, signals: &[CombatSignal], combat: Option<&Combat>) {
        for signal in signals {
            self.handle_signal(signal, combat);
        }
    }
}
