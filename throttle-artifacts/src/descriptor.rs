use throttle_core::{HelperConfig, ServiceRegistration};

/// Generate the launchd property list for the helper daemon.
pub fn generate_descriptor(config: &HelperConfig) -> String {
    render_registration(&config.registration())
}

/// Render a [`ServiceRegistration`] as a launchd plist.
pub fn render_registration(registration: &ServiceRegistration) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
  <key>Label</key>
  <string>{label}</string>
  <key>ProgramArguments</key>
  <array>
    <string>{program}</string>
  </array>
  <key>RunAtLoad</key>
  {run_at_load}
  <key>KeepAlive</key>
  {keep_alive}
</dict>
</plist>
"#,
        label = xml_escape(&registration.label.0),
        program = xml_escape(&registration.program_path.to_string_lossy()),
        run_at_load = plist_bool(registration.run_at_load),
        keep_alive = plist_bool(registration.keep_alive),
    )
}

fn plist_bool(value: bool) -> &'static str {
    if value {
        "<true/>"
    } else {
        "<false/>"
    }
}

fn xml_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use plist::Value;
    use std::path::PathBuf;
    use throttle_core::ServiceLabel;

    #[test]
    fn plist_contains_required_launchd_fields() {
        let plist = generate_descriptor(&HelperConfig::default());

        let value = Value::from_reader_xml(plist.as_bytes()).expect("parse plist");
        let dict = value.as_dictionary().expect("plist root dict");

        assert_eq!(
            dict.get("Label").and_then(Value::as_string),
            Some("com.macthrottle.thermal-monitor")
        );
        assert_eq!(
            dict.get("RunAtLoad").and_then(Value::as_boolean),
            Some(true)
        );
        assert_eq!(
            dict.get("KeepAlive").and_then(Value::as_boolean),
            Some(true)
        );

        let args = dict
            .get("ProgramArguments")
            .and_then(Value::as_array)
            .expect("ProgramArguments array");
        let rendered_args: Vec<&str> = args
            .iter()
            .map(|v| v.as_string().expect("program arg as string"))
            .collect();
        assert_eq!(rendered_args, vec!["/usr/local/bin/mac-throttle-thermal-monitor"]);
    }

    #[test]
    fn special_characters_survive_xml_round_trip() {
        let registration = ServiceRegistration {
            label: ServiceLabel::from("dev.test.a&b"),
            program_path: PathBuf::from("/opt/<odd> dir/monitor"),
            run_at_load: true,
            keep_alive: false,
        };
        let plist = render_registration(&registration);
        let value = Value::from_reader_xml(plist.as_bytes()).expect("parse plist");
        let dict = value.as_dictionary().expect("dict");
        assert_eq!(dict.get("Label").and_then(Value::as_string), Some("dev.test.a&b"));
        assert_eq!(
            dict.get("KeepAlive").and_then(Value::as_boolean),
            Some(false)
        );
        let program = dict
            .get("ProgramArguments")
            .and_then(Value::as_array)
            .and_then(|a| a.first())
            .and_then(Value::as_string);
        assert_eq!(program, Some("/opt/<odd> dir/monitor"));
    }
}
