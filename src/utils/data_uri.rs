use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

pub struct DataUri;

impl DataUri {
    pub fn encode(mime: &str, bytes: &[u8]) -> String {
        format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
    }

    /// Accepts either a full `data:` URI or a bare base64 payload, the form
    /// the segmentation service uses for its images.
    pub fn decode(uri: &str) -> Option<Vec<u8>> {
        let payload = match uri.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest.split_once(',')?;
                if !header.ends_with(";base64") {
                    return None;
                }
                payload
            }
            None => uri,
        };

        STANDARD.decode(payload.trim()).ok()
    }
}
