//! The daemon executable: a bash polling loop.
//!
//! Each pass runs the sensor command, keeps the first indicator line, picks
//! the first keyword of [`PressureLevel::PRIORITY`] present in it (else
//! `unknown`), writes the snapshot JSON to a sibling temp file and renames it
//! over the state file, then sleeps for the configured interval.

use std::fmt::Write as _;

use throttle_core::{HelperConfig, PressureLevel};

use crate::shell;

/// Generate the canonical daemon script for `config`.
pub fn generate_script(config: &HelperConfig) -> String {
    let mut sensor = vec![config.sensor.program.as_str()];
    sensor.extend(config.sensor.args.iter().map(String::as_str));

    let mut branches = String::new();
    for (i, level) in PressureLevel::PRIORITY.iter().enumerate() {
        let keyword = if i == 0 { "if" } else { "elif" };
        // Writing into a String cannot fail.
        let _ = write!(
            branches,
            "    {keyword} echo \"$THERMAL_OUTPUT\" | grep -qi \"{level}\"; then\n        PRESSURE=\"{level}\"\n"
        );
    }

    format!(
        r#"#!/bin/bash
# Managed by macthrottle ({label}); local edits are replaced on update.
OUTPUT_FILE={state}
TMP_FILE="$OUTPUT_FILE.tmp"

while true; do
    THERMAL_OUTPUT=$({sensor} 2>/dev/null | grep -i -F -m 1 -- {indicator})

{branches}    else
        PRESSURE="{unknown}"
    fi

    echo "{{\"pressure\":\"$PRESSURE\",\"timestamp\":$(date +%s)}}" > "$TMP_FILE"
    chmod 644 "$TMP_FILE"
    mv -f "$TMP_FILE" "$OUTPUT_FILE"
    sleep {interval}
done
"#,
        label = config.label,
        state = shell::quote_path(&config.state_file),
        sensor = shell::join(&sensor),
        indicator = shell::quote(&config.sensor.indicator),
        branches = branches,
        unknown = PressureLevel::Unknown,
        interval = config.interval_secs,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_script_shape() {
        let script = generate_script(&HelperConfig::default());
        assert!(script.starts_with("#!/bin/bash\n"));
        assert!(script.contains("OUTPUT_FILE=/tmp/mac-throttle-thermal-state\n"));
        assert!(script.contains(
            "$(powermetrics -s thermal -n 1 -i 1 2>/dev/null | grep -i -F -m 1 -- 'Current pressure level')"
        ));
        assert!(script.contains("    sleep 10\n"));
        assert!(script.contains(r#"mv -f "$TMP_FILE" "$OUTPUT_FILE""#));
    }

    #[test]
    fn branches_follow_priority_order() {
        let script = generate_script(&HelperConfig::default());
        let positions: Vec<usize> = PressureLevel::PRIORITY
            .iter()
            .map(|level| {
                script
                    .find(&format!("PRESSURE=\"{level}\""))
                    .expect("branch present")
            })
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
        assert!(script.contains("    if echo \"$THERMAL_OUTPUT\" | grep -qi \"sleeping\"; then"));
        assert!(script.contains("    elif echo \"$THERMAL_OUTPUT\" | grep -qi \"nominal\"; then"));
        assert!(script.contains("PRESSURE=\"unknown\""));
    }

    #[test]
    fn paths_with_spaces_are_quoted() {
        let config = HelperConfig {
            state_file: "/tmp/thermal state".into(),
            interval_secs: 3,
            ..HelperConfig::default()
        };
        let script = generate_script(&config);
        assert!(script.contains("OUTPUT_FILE='/tmp/thermal state'\n"));
        assert!(script.contains("    sleep 3\n"));
    }

    #[test]
    fn generation_is_deterministic() {
        let config = HelperConfig::default();
        assert_eq!(generate_script(&config), generate_script(&config));
    }
}
