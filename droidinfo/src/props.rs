//! System property lookup with fallbacks.
//!
//! Vendors move properties around, so a lookup tries the canonical name, then
//! known aliases, then a grep over `/system/build.prop`.

use log::{debug, trace};

use crate::bridge::Bridge;
use crate::error::{Error, Result};

/// Alternative names tried when the canonical property is empty.
const ALTERNATIVES: &[(&str, &[&str])] = &[
    (
        "ro.serialno",
        &["ro.boot.serialno", "ril.serialnumber", "sys.serialnumber"],
    ),
    (
        "ro.product.model",
        &["ro.product.model.name", "ro.product.device.model"],
    ),
    (
        "ro.product.manufacturer",
        &["ro.product.brand.manufacturer", "ro.product.vendor.manufacturer"],
    ),
    (
        "ro.product.brand",
        &["ro.product.vendor.brand", "ro.product.manufacturer.brand"],
    ),
    ("ro.product.device", &["ro.hardware.device", "ro.build.device"]),
    ("ro.product.name", &["ro.product.model.full", "ro.build.product"]),
    (
        "ro.build.version.release",
        &["ro.build.version", "ro.system.build.version.release"],
    ),
    (
        "ro.build.version.sdk",
        &["ro.build.version.sdk_int", "ro.sdk.version"],
    ),
    ("ro.build.display.id", &["ro.build.id", "ro.build.fingerprint"]),
    (
        "ro.build.version.security_patch",
        &["ro.vendor.build.security_patch", "ro.build.security_patch"],
    ),
    (
        "persist.sys.locale",
        &["ro.product.locale", "ro.product.locale.region"],
    ),
    (
        "gsm.sim.operator.iso-country",
        &["ro.csc.country_code", "ro.product.locale.region"],
    ),
];

/// Known aliases of `name`.
pub fn alternatives(name: &str) -> &'static [&'static str] {
    ALTERNATIVES
        .iter()
        .find(|(prop, _)| *prop == name)
        .map(|(_, alts)| *alts)
        .unwrap_or_default()
}

/// Whether a `getprop` answer carries a real value.
pub fn is_usable(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }
    let lower = value.to_lowercase();
    !lower.contains("error") && !lower.contains("not found")
}

/// Find `name` in `key=value` lines of a build.prop excerpt.
///
/// An exact key match wins; otherwise the first key containing the last
/// dotted component of `name` is used.
pub fn parse_build_prop(text: &str, name: &str) -> Option<String> {
    let suffix = name
        .rsplit('.')
        .next()
        .unwrap_or(name)
        .to_lowercase();

    let pairs: Vec<(&str, &str)> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
        .filter(|(_, v)| !v.is_empty())
        .collect();

    pairs
        .iter()
        .find(|(k, _)| *k == name)
        .or_else(|| {
            pairs
                .iter()
                .find(|(k, _)| k.to_lowercase().contains(&suffix))
        })
        .map(|(_, v)| (*v).to_string())
}

/// `getprop name` on the device, without fallbacks.
pub fn getprop<B: Bridge + ?Sized>(bridge: &B, serial: &str, name: &str) -> Result<String> {
    let value = bridge.shell(serial, &format!("getprop {name}"))?;
    trace!("getprop {name} = {value:?}");
    if is_usable(&value) {
        Ok(value)
    } else {
        Err(Error::EmptyOutput(format!("getprop {name}")))
    }
}

/// Look up `name`, falling back to aliases and then build.prop.
pub fn lookup<B: Bridge + ?Sized>(bridge: &B, serial: &str, name: &str) -> Result<String> {
    let first_err = match getprop(bridge, serial, name) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    for alt in alternatives(name) {
        if let Ok(value) = getprop(bridge, serial, alt) {
            debug!("{name} resolved through {alt}");
            return Ok(value);
        }
    }

    let suffix = name
        .rsplit('.')
        .next()
        .unwrap_or(name);
    let grep = format!("cat /system/build.prop 2>/dev/null | grep -i \"{suffix}\"");
    if let Ok(text) = bridge.shell(serial, &grep) {
        if let Some(value) = parse_build_prop(&text, name) {
            debug!("{name} resolved through build.prop");
            return Ok(value);
        }
    }

    Err(first_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::ScriptedBridge;

    #[test]
    fn test_alternatives_known_and_unknown() {
        assert_eq!(
            alternatives("ro.serialno"),
            &["ro.boot.serialno", "ril.serialnumber", "sys.serialnumber"]
        );
        assert!(alternatives("ro.unknown.prop").is_empty());
    }

    #[test]
    fn test_is_usable() {
        assert!(is_usable("Pixel 7"));
        assert!(!is_usable(""));
        assert!(!is_usable("   "));
        assert!(!is_usable("Error: permission denied"));
        assert!(!is_usable("/system/bin/sh: getprop: not found"));
    }

    #[test]
    fn test_parse_build_prop_exact_key() {
        let text = "# begin build properties\nro.build.version.sdk=34\nro.build.version.release=14\n";
        assert_eq!(
            parse_build_prop(text, "ro.build.version.release").as_deref(),
            Some("14")
        );
    }

    #[test]
    fn test_parse_build_prop_suffix_match() {
        let text = "ro.vendor.product.model=SM-G991B\n";
        assert_eq!(
            parse_build_prop(text, "ro.product.model").as_deref(),
            Some("SM-G991B")
        );
    }

    #[test]
    fn test_parse_build_prop_no_match() {
        assert_eq!(parse_build_prop("ro.foo=bar\n", "ro.product.model"), None);
        assert_eq!(parse_build_prop("ro.product.model=\n", "ro.product.model"), None);
    }

    #[test]
    fn test_lookup_primary_value() {
        let bridge = ScriptedBridge::new().shell("abc", "getprop ro.product.model", "Pixel 7\n");
        assert_eq!(lookup(&bridge, "abc", "ro.product.model").unwrap(), "Pixel 7");
        assert_eq!(bridge.calls().len(), 1);
    }

    #[test]
    fn test_lookup_uses_alternative() {
        let bridge = ScriptedBridge::new()
            .shell("abc", "getprop ro.serialno", "")
            .shell("abc", "getprop ro.boot.serialno", "")
            .shell("abc", "getprop ril.serialnumber", "R58M12ABCDE");
        assert_eq!(lookup(&bridge, "abc", "ro.serialno").unwrap(), "R58M12ABCDE");
    }

    #[test]
    fn test_lookup_uses_build_prop() {
        let bridge = ScriptedBridge::new()
            .shell("abc", "getprop ro.build.version.sdk", "")
            .shell(
                "abc",
                "cat /system/build.prop 2>/dev/null | grep -i \"sdk\"",
                "ro.build.version.sdk=33\n",
            );
        assert_eq!(lookup(&bridge, "abc", "ro.build.version.sdk").unwrap(), "33");
    }

    #[test]
    fn test_lookup_exhausted_returns_first_error() {
        let bridge = ScriptedBridge::new().shell("abc", "getprop persist.sys.locale", "");
        assert!(matches!(
            lookup(&bridge, "abc", "persist.sys.locale"),
            Err(Error::EmptyOutput(cmd)) if cmd == "getprop persist.sys.locale"
        ));
    }
}
