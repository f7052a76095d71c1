//! List available audio input devices.

use super::BANNER;
use crate::capture::microphone::suppress_alsa_warnings;
use anyhow::anyhow;
use cpal::traits::{DeviceTrait, HostTrait};

/// Lists the microphones viva can record answers from.
///
/// # Errors
/// - If the audio host cannot enumerate devices
pub fn handle_list_devices() -> anyhow::Result<()> {
    let (default_name, devices) = suppress_alsa_warnings(|| {
        let host = cpal::default_host();
        let devices: Vec<cpal::Device> = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate audio devices: {e}"))?
            .filter(|d| d.name().is_ok())
            .collect();
        let default_name = host.default_input_device().and_then(|d| d.name().ok());
        Ok::<_, anyhow::Error>((default_name, devices))
    })?;

    if devices.is_empty() {
        println!("No audio input devices found on this system.");
        println!("Answers cannot be recorded until a microphone is connected.");
        return Ok(());
    }

    println!("{BANNER}");
    println!("Available audio input devices:");
    println!();

    for (index, device) in devices.iter().enumerate() {
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let default_indicator = if default_name.as_ref() == Some(&name) {
            " [DEFAULT]"
        } else {
            ""
        };
        let config_info = match device.default_input_config() {
            Ok(config) => format!("{}Hz, {} channels", config.sample_rate().0, config.channels()),
            Err(_) => "configuration unavailable".to_string(),
        };

        println!("  ID: {index}");
        println!("    Name: {name}{default_indicator}");
        println!("    Config: {config_info}");
        println!();
    }

    println!("Set [audio] device in viva.toml to an ID or name above.");
    Ok(())
}
