//! Completion sound.
//!
//! The platform supplies a [`SoundPlayer`]; the hunt only ever holds one loaded
//! sound at a time, inside a [`SoundSlot`] that releases it when dropped.
//! Sound references may name a bundled asset, a local file or a remote URI.

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use reqwest::Url;
use twox_hash::XxHash64;

#[derive(Debug, thiserror::Error)]
pub enum SoundError {
    #[error("Failed to load sound: {0}")]
    Load(String),

    #[error("Failed to play sound: {0}")]
    Playback(String),

    #[error("Failed to download sound: {0}")]
    Download(#[from] reqwest::Error),

    #[error("Sound cache error: {0}")]
    Cache(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SoundError>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SoundSource {
    /// Asset shipped with the app, by name
    Bundled(String),
    Local(PathBuf),
    Remote(Url),
}

impl FromStr for SoundSource {
    type Err = SoundError;

    fn from_str(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(SoundError::Load("empty sound reference".to_owned()));
        }

        if let Ok(url) = Url::parse(reference) {
            match url.scheme() {
                "http" | "https" => return Ok(SoundSource::Remote(url)),
                "file" => {
                    if let Ok(path) = url.to_file_path() {
                        return Ok(SoundSource::Local(path));
                    }
                }
                _ => {}
            }
        }

        if Path::new(reference).is_absolute() {
            return Ok(SoundSource::Local(PathBuf::from(reference)));
        }

        Ok(SoundSource::Bundled(reference.to_owned()))
    }
}

impl fmt::Display for SoundSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoundSource::Bundled(name) => write!(f, "{name}"),
            SoundSource::Local(path) => write!(f, "{}", path.display()),
            SoundSource::Remote(url) => write!(f, "{url}"),
        }
    }
}

/// Platform audio.
///
/// Calls must return promptly; playback itself is expected to continue in
/// the background.
pub trait SoundPlayer: Send + 'static {
    type Sound: Send;

    fn load(&mut self, source: &SoundSource) -> Result<Self::Sound>;
    fn play(&mut self, sound: &Self::Sound) -> Result<()>;
    fn release(&mut self, sound: Self::Sound);
}

/// Owns at most one loaded sound and releases it on drop.
pub struct SoundSlot<P: SoundPlayer> {
    player: P,
    loaded: Option<P::Sound>,
}

impl<P: SoundPlayer> SoundSlot<P> {
    pub fn new(player: P) -> Self {
        Self {
            player,
            loaded: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Load on first use, then play
    pub fn play(&mut self, source: &SoundSource) -> Result<()> {
        let sound = match self.loaded.take() {
            Some(sound) => sound,
            None => self.player.load(source)?,
        };

        let result = self.player.play(&sound);
        self.loaded = Some(sound);
        result
    }
}

impl<P: SoundPlayer> Drop for SoundSlot<P> {
    fn drop(&mut self) {
        if let Some(sound) = self.loaded.take() {
            tracing::debug!("releasing sound");
            self.player.release(sound);
        }
    }
}

/// Turns remote references into local files when a cache directory is set.
///
/// Without a cache, or when the download fails, the remote URI is handed to
/// the player untouched.
#[derive(Clone, Debug)]
pub struct SoundResolver {
    cache_dir: Option<PathBuf>,
    client: reqwest::Client,
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(20);

impl SoundResolver {
    pub fn new(cache_dir: Option<PathBuf>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .unwrap_or_else(|error| {
                tracing::warn!(%error, "could not configure HTTP client, using defaults");
                reqwest::Client::new()
            });

        Self { cache_dir, client }
    }

    pub fn cache_path(&self, url: &Url) -> Option<PathBuf> {
        let dir = self.cache_dir.as_ref()?;
        let hash = XxHash64::oneshot(0, url.as_str().as_bytes());
        let extension = Path::new(url.path())
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("bin");

        Some(dir.join(format!("{hash:016x}.{extension}")))
    }

    pub async fn resolve(&self, source: &SoundSource) -> SoundSource {
        let SoundSource::Remote(url) = source else {
            return source.clone();
        };

        match self.fetch_to_cache(url).await {
            Ok(Some(path)) => SoundSource::Local(path),
            Ok(None) => source.clone(),
            Err(error) => {
                tracing::warn!(%url, %error, "falling back to streaming remote sound");
                source.clone()
            }
        }
    }

    async fn fetch_to_cache(&self, url: &Url) -> Result<Option<PathBuf>> {
        let Some(path) = self.cache_path(url) else {
            return Ok(None);
        };

        if tokio::fs::try_exists(&path).await? {
            return Ok(Some(path));
        }

        let bytes: bytes::Bytes = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let partial = path.with_extension("part");
        tokio::fs::write(&partial, &bytes).await?;
        tokio::fs::rename(&partial, &path).await?;

        tracing::debug!(%url, path = %path.display(), size = bytes.len(), "cached remote sound");
        Ok(Some(path))
    }
}
