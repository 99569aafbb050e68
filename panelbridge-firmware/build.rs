//! Build script for panelbridge-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates bridge.toml at compile time
//! - Generates the `BRIDGE_CONFIG` constant from bridge.toml

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    setup_linker();
    let config = validate_config();
    generate_config(&config);
}

/// Set up linker search paths and scripts
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    if env::var_os("CARGO_FEATURE_DEFMT").is_some() {
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Settings read from bridge.toml
struct ParsedConfig {
    width: u16,
    height: u16,
    rotation_deg: u16,
    tick_period_ms: u32,
    loop_delay_ms: u32,
    max_flush_failures: u8,
    draw_buffer_lines: u16,
    force_calibration: bool,
}

/// Validate bridge.toml configuration at compile time
fn validate_config() -> ParsedConfig {
    // Re-run if bridge.toml changes
    println!("cargo:rerun-if-changed=bridge.toml");

    let config_path = Path::new("bridge.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: bridge.toml not found!                                   ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a bridge.toml configuration file.         ║\n\
            ║  Please create one in the panelbridge-firmware directory.        ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read bridge.toml                               ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Parse and validate TOML syntax
    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in bridge.toml                       ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    validate_required_sections(&config);

    let mut errors = Vec::new();

    let width = integer(&config, "panel", "width", 1, 4096, None, &mut errors);
    let height = integer(&config, "panel", "height", 1, 4096, None, &mut errors);
    let rotation_deg = integer(&config, "panel", "rotation", 0, 270, Some(0), &mut errors);
    if ![0, 90, 180, 270].contains(&rotation_deg) {
        errors.push("[panel] rotation must be 0, 90, 180 or 270".to_string());
    }

    let tick_period_ms = integer(&config, "bridge", "tick_period_ms", 1, 1000, Some(1), &mut errors);
    let loop_delay_ms = integer(&config, "bridge", "loop_delay_ms", 0, 1000, Some(5), &mut errors);
    let max_flush_failures =
        integer(&config, "bridge", "max_flush_failures", 1, 255, Some(3), &mut errors);
    let draw_buffer_lines =
        integer(&config, "bridge", "draw_buffer_lines", 1, 4096, Some(10), &mut errors);

    // The draw buffer spans the logical width and at most the logical height
    let logical_height = if rotation_deg == 90 || rotation_deg == 270 {
        width
    } else {
        height
    };
    if draw_buffer_lines > logical_height {
        errors.push(format!(
            "[bridge] draw_buffer_lines must not exceed the screen height ({})",
            logical_height
        ));
    }

    let force_calibration = match config.get("calibration").and_then(|c| c.get("force")) {
        None => false,
        Some(toml::Value::Boolean(b)) => *b,
        Some(_) => {
            errors.push("[calibration] force must be true or false".to_string());
            false
        }
    };

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid configuration in bridge.toml                     ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=bridge.toml validated successfully");

    ParsedConfig {
        width: width as u16,
        height: height as u16,
        rotation_deg: rotation_deg as u16,
        tick_period_ms: tick_period_ms as u32,
        loop_delay_ms: loop_delay_ms as u32,
        max_flush_failures: max_flush_failures as u8,
        draw_buffer_lines: draw_buffer_lines as u16,
        force_calibration,
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Validate that required sections exist
fn validate_required_sections(config: &toml::Value) {
    let mut errors = Vec::new();

    if config.get("panel").is_none() {
        errors.push("Missing [panel] section - panel width and height are required");
    }

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Missing required sections in bridge.toml                 ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
}

/// Read an integer field, recording an error if it is missing or out of range
///
/// Missing fields fall back to `default` when one is given.
fn integer(
    config: &toml::Value,
    section: &str,
    key: &str,
    min: i64,
    max: i64,
    default: Option<i64>,
    errors: &mut Vec<String>,
) -> i64 {
    match config.get(section).and_then(|s| s.get(key)) {
        Some(toml::Value::Integer(v)) if (min..=max).contains(v) => *v,
        Some(toml::Value::Integer(_)) => {
            errors.push(format!("[{}] {} must be {}-{}", section, key, min, max));
            default.unwrap_or(min)
        }
        Some(_) => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            default.unwrap_or(min)
        }
        None => match default {
            Some(v) => v,
            None => {
                errors.push(format!("[{}] missing '{}'", section, key));
                min
            }
        },
    }
}

/// Write the validated settings as a `BridgeConfig` constant
fn generate_config(config: &ParsedConfig) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let rotation = match config.rotation_deg {
        90 => "Deg90",
        180 => "Deg180",
        270 => "Deg270",
        _ => "Deg0",
    };

    let source = format!(
        "/// Board configuration generated from bridge.toml\n\
         pub const BRIDGE_CONFIG: BridgeConfig = BridgeConfig {{\n    \
             native: PanelSize::new({}, {}),\n    \
             rotation: Rotation::{},\n    \
             tick_period_ms: {},\n    \
             loop_delay_ms: {},\n    \
             max_flush_failures: {},\n    \
             draw_buffer_lines: {},\n    \
             force_calibration: {},\n\
         }};\n",
        config.width,
        config.height,
        rotation,
        config.tick_period_ms,
        config.loop_delay_ms,
        config.max_flush_failures,
        config.draw_buffer_lines,
        config.force_calibration,
    );

    fs::write(out_dir.join("bridge_config.rs"), source).unwrap();
}
