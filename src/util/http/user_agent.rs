use rand::Rng;

const CHROME_VERSIONS: [&str; 20] = [
    "131.0.6778.139", "131.0.6778.205", "132.0.6834.83", "132.0.6834.159",
    "133.0.6943.98", "133.0.6943.126", "134.0.6998.88", "134.0.6998.165",
    "135.0.7049.84", "135.0.7049.114", "136.0.7103.92", "136.0.7103.113",
    "137.0.7151.55", "137.0.7151.119", "138.0.7204.100", "138.0.7204.157",
    "139.0.7258.66", "139.0.7258.128", "140.0.7339.80", "140.0.7339.127",
];

// Sessions really present as desktop Chrome, so the platform strings must
// agree with that engine fingerprint. No mobile, no foreign browsers.
const WINDOWS: [&str; 4] = [
    "Windows NT 10.0; Win64; x64",
    "Windows NT 10.0; Win64; x64",
    "Windows NT 10.0; WOW64",
    "Windows NT 6.1; Win64; x64",
];

const MACOS: [&str; 6] = [
    "Macintosh; Intel Mac OS X 10_15_7",
    "Macintosh; Intel Mac OS X 12_7_6",
    "Macintosh; Intel Mac OS X 13_6_9",
    "Macintosh; Intel Mac OS X 14_7_2",
    "Macintosh; Intel Mac OS X 15_3",
    "Macintosh; Intel Mac OS X 15_5",
];

const LINUX: [&str; 5] = [
    "X11; Linux x86_64",
    "X11; Linux x86_64",
    "X11; Ubuntu; Linux x86_64",
    "X11; Fedora; Linux x86_64",
    "X11; Debian; Linux x86_64",
];

fn gen_chrome_ua() -> String {
    let mut rng = rand::rng();

    let platform = match rng.random_range(0..3) {
        0 => WINDOWS[rng.random_range(0..WINDOWS.len())],
        1 => MACOS[rng.random_range(0..MACOS.len())],
        _ => LINUX[rng.random_range(0..LINUX.len())],
    };
    let version = CHROME_VERSIONS[rng.random_range(0..CHROME_VERSIONS.len())];

    format!(
        "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Safari/537.36",
        platform, version
    )
}

/// Random desktop Chrome user agent, shared by the reqwest client and the
/// rendering sessions.
pub fn gen_random_ua() -> String {
    gen_chrome_ua()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gen_random_ua_variety() {
        println!("\n=== Testing User Agent Variety ===");
        for i in 1..=10 {
            let ua = gen_random_ua();
            println!("{:2}. {}", i, ua);
        }
    }

    #[test]
    fn test_ua_formats() {
        for _ in 0..100 {
            let ua = gen_random_ua();
            assert!(ua.starts_with("Mozilla/5.0"), "UA should start with Mozilla/5.0: {}", ua);
            assert!(ua.contains("Chrome/"), "UA should be a Chrome UA: {}", ua);
            assert!(!ua.contains("Mobile"), "UA should be desktop only: {}", ua);
            assert!(ua.len() > 50, "UA should be reasonably long: {}", ua);
        }
    }
}
