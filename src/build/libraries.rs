// ABOUTME: Interprets `ldd` output captured inside the build container.
// ABOUTME: Keeps what must ship with the binary and skips what the function base image provides.

/// Libraries provided by the custom-runtime base image.
const BASE_IMAGE_LIBRARIES: &[&str] = &[
    "linux-vdso.so",
    "linux-gate.so",
    "ld-linux",
    "libc.so",
    "libm.so",
    "libdl.so",
    "librt.so",
    "libpthread.so",
    "libgcc_s.so",
    "libutil.so",
];

fn is_base_library(name: &str) -> bool {
    BASE_IMAGE_LIBRARIES.iter().any(|prefix| name.starts_with(prefix))
}

/// Shared libraries a binary loads, as seen from inside the build image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkedLibraries {
    /// Container paths of the libraries to bundle, sorted.
    pub paths: Vec<String>,
    /// Sonames the loader could not find.
    pub missing: Vec<String>,
}

/// Interpret one `ldd` run. `ldd` already reports the transitive closure.
///
/// Statically linked binaries have nothing to bundle. Any other non-zero
/// exit is an error carrying ldd's own message.
pub fn from_ldd(exit_code: i64, stdout: &str, stderr: &str) -> Result<LinkedLibraries, String> {
    if stdout.contains("statically linked") || stderr.contains("not a dynamic executable") {
        return Ok(LinkedLibraries::default());
    }

    if exit_code != 0 {
        let message = if stderr.trim().is_empty() {
            stdout.trim()
        } else {
            stderr.trim()
        };
        return Err(format!("ldd exited with status {}: {}", exit_code, message));
    }

    Ok(parse_ldd(stdout))
}

fn parse_ldd(output: &str) -> LinkedLibraries {
    let mut libraries = LinkedLibraries::default();

    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let name = line.split_whitespace().next().unwrap_or_default();
        let name = name.rsplit('/').next().unwrap_or(name);

        if is_base_library(name) {
            continue;
        }

        match line.split_once("=>") {
            Some((_, target)) => {
                let target = target.trim();
                if target.starts_with("not found") {
                    libraries.missing.push(name.to_string());
                } else if let Some(path) = target.split_whitespace().next()
                    && path.starts_with('/')
                {
                    libraries.paths.push(path.to_string());
                }
            }
            None if line.starts_with('/') => {
                if let Some(path) = line.split_whitespace().next() {
                    libraries.paths.push(path.to_string());
                }
            }
            None => {}
        }
    }

    libraries.paths.sort();
    libraries.paths.dedup();
    libraries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_base_image_libraries() {
        let output = "\
\tlinux-vdso.so.1 (0x00007ffc8a5f2000)
\tlibssl.so.3 => /lib/x86_64-linux-gnu/libssl.so.3 (0x00007f1e2c000000)
\tlibgcc_s.so.1 => /lib/x86_64-linux-gnu/libgcc_s.so.1 (0x00007f1e2bf00000)
\tlibc.so.6 => /lib/x86_64-linux-gnu/libc.so.6 (0x00007f1e2bc00000)
\tlibcrypto.so.3 => /lib/x86_64-linux-gnu/libcrypto.so.3 (0x00007f1e2b600000)
\t/lib64/ld-linux-x86-64.so.2 (0x00007f1e2c2a0000)
";
        let libraries = from_ldd(0, output, "").unwrap();
        assert_eq!(
            libraries.paths,
            vec![
                "/lib/x86_64-linux-gnu/libcrypto.so.3".to_string(),
                "/lib/x86_64-linux-gnu/libssl.so.3".to_string(),
            ]
        );
        assert!(libraries.missing.is_empty());
    }

    #[test]
    fn unresolved_libraries_are_reported_not_dropped() {
        let output = "\tlibpq.so.5 => not found\n\tlibz.so.1 => /lib/libz.so.1 (0x1)\n";
        let libraries = from_ldd(0, output, "").unwrap();
        assert_eq!(libraries.missing, vec!["libpq.so.5".to_string()]);
        assert_eq!(libraries.paths, vec!["/lib/libz.so.1".to_string()]);
    }

    #[test]
    fn static_binaries_need_nothing() {
        let libraries = from_ldd(1, "", "\tnot a dynamic executable\n").unwrap();
        assert_eq!(libraries, LinkedLibraries::default());

        let libraries = from_ldd(0, "\tstatically linked\n", "").unwrap();
        assert_eq!(libraries, LinkedLibraries::default());
    }

    #[test]
    fn ldd_missing_from_the_image_is_an_error() {
        let err = from_ldd(127, "", "sh: 1: ldd: not found").unwrap_err();
        assert!(err.contains("127"));
        assert!(err.contains("ldd: not found"));
    }
}
