//! Deterministic device fingerprinting.

use sha2::{Digest, Sha256};

/// Device profiles the fingerprint picks from. Stable list order matters:
/// reordering would change which device existing accounts present.
const DEVICE_BUILDS: &[&str] = &[
    "24/7.0; 380dpi; 1080x1920; OnePlus; ONEPLUS A3010; OnePlus3T; qcom",
    "26/8.0.0; 480dpi; 1080x1920; Xiaomi; MI 5s; capricorn; qcom",
    "28/9.0; 560dpi; 1440x2560; samsung; SM-G965F; star2lte; samsungexynos9810",
    "28/9.0; 420dpi; 1080x2260; HUAWEI; ELE-L29; HWELE; kirin980",
    "27/8.1.0; 440dpi; 1080x2280; Xiaomi; Redmi Note 6 Pro; tulip; qcom",
];

/// A stable device identity derived from the account username.
///
/// Re-deriving for the same username always yields the same fingerprint, so
/// the platform sees one consistent device per account across restarts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub device_id: String,
    pub phone_id: String,
    pub uuid: String,
    pub build: String,
}

impl DeviceIdentity {
    #[must_use]
    pub fn derive(username: &str) -> Self {
        let digest: [u8; 32] = Sha256::digest(username.as_bytes()).into();
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();

        let mut phone_seed = [0u8; 16];
        phone_seed.copy_from_slice(&digest[..16]);
        let mut uuid_seed = [0u8; 16];
        uuid_seed.copy_from_slice(&digest[16..]);

        Self {
            device_id: format!("android-{}", &hex[..16]),
            phone_id: uuid::Builder::from_random_bytes(phone_seed)
                .into_uuid()
                .to_string(),
            uuid: uuid::Builder::from_random_bytes(uuid_seed)
                .into_uuid()
                .to_string(),
            build: DEVICE_BUILDS[digest[0] as usize % DEVICE_BUILDS.len()].to_string(),
        }
    }
}
