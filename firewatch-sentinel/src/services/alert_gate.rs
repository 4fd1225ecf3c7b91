//! Alert escalation gate
//!
//! Consulted for newly INSERTED events only. A merged event never reaches
//! the gate; that is the mechanism that keeps a persistent fire seen every
//! cycle from re-alerting every cycle.

use crate::models::Zone;

pub struct AlertGate {
    /// Escalate at or above this intensity anywhere, MW
    global_frp_mw: f64,
    /// Escalation floor inside the secondary high-risk zone, MW
    secondary_frp_mw: f64,
}

impl AlertGate {
    pub fn new(global_frp_mw: f64, secondary_frp_mw: f64) -> Self {
        Self {
            global_frp_mw,
            secondary_frp_mw,
        }
    }

    /// Escalate when the event is in the home zone, hot enough for the
    /// secondary zone, or hot enough anywhere.
    pub fn should_escalate(&self, zone: Zone, frp_mw: f64) -> bool {
        if zone == Zone::HOME {
            return true;
        }
        if zone == Zone::SECONDARY && frp_mw >= self.secondary_frp_mw {
            return true;
        }
        frp_mw >= self.global_frp_mw
    }
}
