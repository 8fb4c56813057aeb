use crate::session::error::VerificationError;
use crate::session::verifier::{DeviceInfo, DeviceProbe};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::path::{Path, PathBuf};

/// Probes block devices on the local machine.
///
/// On Linux this asks `lsblk` for size, filesystem and mount points of the
/// device and its partitions. Elsewhere only the size from file metadata is
/// available.
#[derive(Debug, Clone, Default)]
pub struct LsblkProbe;

impl LsblkProbe {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceProbe for LsblkProbe {
    fn probe<'a>(
        &'a self,
        device_id: &'a str,
    ) -> BoxFuture<'a, Result<DeviceInfo, VerificationError>> {
        async move {
            let path = device_path(device_id);
            if !path.exists() {
                return Err(VerificationError::NotFound(path.display().to_string()));
            }
            probe_path(&path).await
        }
        .boxed()
    }
}

/// Companion ids are usually `/dev/...` paths; bare names like `sdb` are
/// resolved under `/dev`.
pub fn device_path(device_id: &str) -> PathBuf {
    if device_id.contains('/') {
        PathBuf::from(device_id)
    } else {
        Path::new("/dev").join(device_id)
    }
}

#[cfg(target_os = "linux")]
async fn probe_path(path: &Path) -> Result<DeviceInfo, VerificationError> {
    let output = tokio::process::Command::new("lsblk")
        .args(["-b", "-n", "-P", "-o", "SIZE,FSTYPE,MOUNTPOINT"])
        .arg(path)
        .output()
        .await
        .map_err(|e| VerificationError::Probe(format!("failed to run lsblk: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(VerificationError::Probe(stderr.trim().to_string()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_lsblk(&path.display().to_string(), &stdout)
}

#[cfg(not(target_os = "linux"))]
async fn probe_path(path: &Path) -> Result<DeviceInfo, VerificationError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| VerificationError::Probe(e.to_string()))?;
    Ok(DeviceInfo {
        path: path.display().to_string(),
        size: metadata.len(),
        filesystem: None,
        mounted: false,
        mount_points: Vec::new(),
    })
}

/// Parse `lsblk -P` output. The first row is the disk itself, any further
/// rows are its partitions.
pub fn parse_lsblk(path: &str, output: &str) -> Result<DeviceInfo, VerificationError> {
    let rows: Vec<Vec<(String, String)>> = output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_pairs)
        .collect();

    let disk = rows
        .first()
        .ok_or_else(|| VerificationError::Unparseable("lsblk printed nothing".to_string()))?;

    let size_text = field(disk, "SIZE")
        .ok_or_else(|| VerificationError::Unparseable("missing SIZE column".to_string()))?;
    let size = size_text
        .parse::<u64>()
        .map_err(|_| VerificationError::Unparseable(format!("invalid size '{}'", size_text)))?;

    let filesystem = rows
        .iter()
        .filter_map(|row| field(row, "FSTYPE"))
        .find(|fs| !fs.is_empty())
        .map(str::to_string);

    let mount_points: Vec<String> = rows
        .iter()
        .filter_map(|row| field(row, "MOUNTPOINT"))
        .filter(|mp| !mp.is_empty())
        .map(str::to_string)
        .collect();

    Ok(DeviceInfo {
        path: path.to_string(),
        size,
        filesystem,
        mounted: !mount_points.is_empty(),
        mount_points,
    })
}

fn field<'a>(row: &'a [(String, String)], key: &str) -> Option<&'a str> {
    row.iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Split `KEY="value" KEY2="value 2"` into pairs. lsblk escapes quotes and
/// spaces inside values as `\xNN`, which are decoded here.
fn parse_pairs(line: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut rest = line.trim();

    while let Some(eq) = rest.find("=\"") {
        let key = rest[..eq].trim().to_string();
        let after = &rest[eq + 2..];
        let Some(end) = after.find('"') else {
            break;
        };
        pairs.push((key, unescape(&after[..end])));
        rest = after[end + 1..].trim_start();
    }

    pairs
}

/// Decode lsblk's `\xNN` escapes. Escaped bytes may form multi-byte UTF-8.
fn unescape(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' && bytes.get(i + 1) == Some(&b'x') {
            let decoded = bytes
                .get(i + 2..i + 4)
                .filter(|hex| hex.iter().all(u8::is_ascii_hexdigit))
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(byte) = decoded {
                out.push(byte);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmounted_disk_with_partition() {
        let output = "SIZE=\"8589934592\" FSTYPE=\"\" MOUNTPOINT=\"\"\n\
                      SIZE=\"8588886016\" FSTYPE=\"vfat\" MOUNTPOINT=\"\"\n";
        let info = parse_lsblk("/dev/sdb", output).unwrap();
        assert_eq!(info.size, 8_589_934_592);
        assert_eq!(info.filesystem.as_deref(), Some("vfat"));
        assert!(!info.mounted);
        assert!(info.mount_points.is_empty());
    }

    #[test]
    fn test_mounted_partition_marks_device_mounted() {
        let output = "SIZE=\"16008609792\" FSTYPE=\"\" MOUNTPOINT=\"\"\n\
                      SIZE=\"16007561216\" FSTYPE=\"exfat\" MOUNTPOINT=\"/media/usb\\x20stick\"\n";
        let info = parse_lsblk("/dev/sdc", output).unwrap();
        assert!(info.mounted);
        assert_eq!(info.mount_points, vec!["/media/usb stick".to_string()]);
    }

    #[test]
    fn test_unescape_multibyte_utf8() {
        assert_eq!(unescape("/media/\\xc3\\xa9t\\xc3\\xa9"), "/media/été");
        assert_eq!(unescape("USB\\x20KEY"), "USB KEY");
        assert_eq!(unescape("a\\xzz\\"), "a\\xzz\\");
    }

    #[test]
    fn test_empty_output_is_unparseable() {
        assert!(matches!(
            parse_lsblk("/dev/sdb", "\n"),
            Err(VerificationError::Unparseable(_))
        ));
    }

    #[test]
    fn test_bad_size_is_unparseable() {
        let output = "SIZE=\"lots\" FSTYPE=\"\" MOUNTPOINT=\"\"";
        assert!(matches!(
            parse_lsblk("/dev/sdb", output),
            Err(VerificationError::Unparseable(_))
        ));
    }

    #[test]
    fn test_device_path_resolution() {
        assert_eq!(device_path("sdb"), PathBuf::from("/dev/sdb"));
        assert_eq!(device_path("/dev/disk2"), PathBuf::from("/dev/disk2"));
    }

    #[tokio::test]
    async fn test_missing_device_is_not_found() {
        let probe = LsblkProbe::new();
        let result = probe.probe("/nonexistent/webboot-test-device").await;
        assert!(matches!(result, Err(VerificationError::NotFound(_))));
    }
}
