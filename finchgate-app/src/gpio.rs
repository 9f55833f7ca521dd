use crate::config::GatesConfig;
use anyhow::{Context, Result};
use finchgate_experiment::SessionEvent;
use rppal::gpio::{Event, Gpio, InputPin, Trigger};
use tracing::{debug, info};
use winit::event_loop::EventLoopProxy;

/// Light gate inputs. Interrupts stay registered while this is alive.
pub struct GateInputs {
    _pins: Vec<InputPin>,
}

/// Pulls the gate pins up and forwards every debounced falling edge to the
/// event loop as a gate crossing.
pub fn watch(config: &GatesConfig, proxy: EventLoopProxy<SessionEvent>) -> Result<GateInputs> {
    let gpio = Gpio::new().context("cannot open the GPIO peripheral")?;
    let mut pins = Vec::with_capacity(3);
    for (gate, number) in config.pins() {
        let mut pin = gpio
            .get(number)
            .with_context(|| format!("cannot claim BCM pin {number} for the {gate} gate"))?
            .into_input_pullup();
        let proxy = proxy.clone();
        pin.set_async_interrupt(
            Trigger::FallingEdge,
            Some(config.debounce()),
            move |_: Event| {
                if proxy.send_event(SessionEvent::Gate(gate)).is_err() {
                    debug!("Event loop gone, dropping {gate} crossing");
                }
            },
        )
        .with_context(|| format!("cannot watch BCM pin {number}"))?;
        info!("Watching {gate} gate on BCM pin {number}");
        pins.push(pin);
    }
    Ok(GateInputs { _pins: pins })
}
