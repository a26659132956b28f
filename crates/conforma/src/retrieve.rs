//! Retrieval of external schema resources.
use fluent_uri::Uri;
use serde_json::Value;

/// Trait for loading resources that are not already known to a context.
///
/// The reference-resolution pass calls into the retriever for every base URI
/// it cannot find locally; this is the only point where a parse touches the
/// outside world. All operations are blocking.
pub trait Retrieve: Send + Sync {
    /// Attempt to retrieve the resource identified by `uri`.
    ///
    /// # Errors
    ///
    /// If the resource could not be retrieved.
    fn retrieve(&self, uri: &Uri<&str>) -> Result<Value, Box<dyn std::error::Error + Send + Sync>>;
}

/// The retriever used when none is configured.
///
/// Fetches `file://` resources when the `resolve-file` feature is enabled
/// and `http(s)://` resources when `resolve-http` is; refuses everything
/// else.
#[derive(Debug, PartialEq, Eq)]
pub struct DefaultRetriever;

impl Retrieve for DefaultRetriever {
    fn retrieve(&self, uri: &Uri<&str>) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        match uri.scheme().as_str() {
            "http" | "https" => {
                #[cfg(feature = "resolve-http")]
                {
                    Ok(reqwest::blocking::get(uri.as_str())?.json()?)
                }
                #[cfg(not(feature = "resolve-http"))]
                Err("`resolve-http` feature or a custom retriever is required to fetch schemas via HTTP".into())
            }
            "file" => {
                #[cfg(feature = "resolve-file")]
                {
                    let path = percent_encoding::percent_decode_str(uri.path().as_str())
                        .decode_utf8()?
                        .into_owned();
                    let file = std::fs::File::open(path)?;
                    Ok(serde_json::from_reader(file)?)
                }
                #[cfg(not(feature = "resolve-file"))]
                {
                    Err("`resolve-file` feature or a custom retriever is required to fetch schemas from files".into())
                }
            }
            scheme => Err(format!("Cannot fetch resources with scheme '{scheme}'").into()),
        }
    }
}
