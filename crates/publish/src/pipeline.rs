//! The publish sequence: session, login, upload, unconditional post-login
//! cleanup, and a structured outcome that never becomes an exception.

use std::path::{Path, PathBuf};

use {
    serde_json::Value,
    tokio::fs,
    tracing::{debug, error, info, warn},
};

use gramflow_cron::{MediaKind, ScheduledJob};

use crate::{
    error::PublishError,
    platform::{AccountCredentials, PlatformClient, PlatformSession, is_benign_post_login},
    retry::{PHOTO_UPLOAD, RetryProfile, VIDEO_UPLOAD},
    thumbnail::derive_thumbnail,
};

/// Transient result of one publish. Returned synchronously to the caller,
/// never persisted.
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub success: bool,
    pub message: String,
    pub platform_result: Option<Value>,
}

impl PublishOutcome {
    fn published(platform_result: Value) -> Self {
        Self {
            success: true,
            message: "media published successfully".into(),
            platform_result: Some(platform_result),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            platform_result: None,
        }
    }
}

/// What to publish. Credentials arrive separately, resolved by the caller at
/// publish time.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub media_path: PathBuf,
    pub media_kind: MediaKind,
    pub caption: String,
    pub thumbnail_path: Option<PathBuf>,
}

impl From<&ScheduledJob> for PublishRequest {
    fn from(job: &ScheduledJob) -> Self {
        Self {
            media_path: job.media_path.clone(),
            media_kind: job.media_kind,
            caption: job.caption.clone(),
            thumbnail_path: job.thumbnail_path.clone(),
        }
    }
}

/// Cover image for a video upload. A pipeline-derived cover is temporary and
/// gets deleted after use whether or not the upload succeeded.
enum CoverSource {
    Provided(PathBuf),
    Derived(PathBuf),
}

impl CoverSource {
    fn path(&self) -> &Path {
        match self {
            Self::Provided(p) | Self::Derived(p) => p,
        }
    }
}

async fn remove_if_derived(cover: &CoverSource) {
    if let CoverSource::Derived(path) = cover {
        match fs::remove_file(path).await {
            Ok(()) => debug!(path = %path.display(), "removed derived cover"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove derived cover"),
        }
    }
}

/// The publish pipeline.
pub struct PublishPipeline<C: PlatformClient> {
    client: C,
    ffmpeg_binary: String,
    photo_retry: RetryProfile,
}

impl<C: PlatformClient> PublishPipeline<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            ffmpeg_binary: "ffmpeg".into(),
            photo_retry: PHOTO_UPLOAD,
        }
    }

    #[must_use]
    pub fn with_ffmpeg_binary(mut self, binary: impl Into<String>) -> Self {
        self.ffmpeg_binary = binary.into();
        self
    }

    /// Override the photo retry profile (tests drop the pause).
    #[must_use]
    pub fn with_photo_retry(mut self, profile: RetryProfile) -> Self {
        self.photo_retry = profile;
        self
    }

    /// Publish one piece of media. Errors become a failure outcome; nothing
    /// propagates past this boundary.
    pub async fn publish(
        &self,
        request: &PublishRequest,
        credentials: &AccountCredentials,
    ) -> PublishOutcome {
        info!(
            media = %request.media_path.display(),
            kind = ?request.media_kind,
            username = %credentials.username,
            "starting publish"
        );

        let mut session = self.client.open_session(&credentials.username);
        let result = self
            .authenticated_publish(&mut session, request, credentials)
            .await;

        // The platform's post-login simulation runs on every exit path from
        // the login attempt onward. Its failures never replace the primary
        // outcome.
        match self.client.post_login_flow(&session).await {
            Ok(()) => {},
            Err(e) if is_benign_post_login(&e) => {
                info!("post-login flow missed suggested searches; harmless, ignoring");
            },
            Err(e) => {
                error!(error = %e, "unexpected post-login flow failure");
            },
        }

        match result {
            Ok(platform_result) => {
                info!(username = %credentials.username, "publish succeeded");
                PublishOutcome::published(platform_result)
            },
            Err(e) => {
                error!(error = %e, "publish failed");
                PublishOutcome::failure(e.to_string())
            },
        }
    }

    async fn authenticated_publish(
        &self,
        session: &mut PlatformSession,
        request: &PublishRequest,
        credentials: &AccountCredentials,
    ) -> Result<Value, PublishError> {
        self.client.pre_login_flow(session).await?;

        self.client
            .login(session, credentials)
            .await
            .map_err(|e| PublishError::Login {
                username: credentials.username.clone(),
                reason: e.to_string(),
            })?;
        info!(username = %credentials.username, "login succeeded");

        match request.media_kind {
            MediaKind::Image => self.upload_photo(session, request).await,
            MediaKind::Video => self.upload_video(session, request).await,
        }
    }

    async fn upload_photo(
        &self,
        session: &PlatformSession,
        request: &PublishRequest,
    ) -> Result<Value, PublishError> {
        if fs::metadata(&request.media_path).await.is_err() {
            return Err(PublishError::MediaNotFound {
                path: request.media_path.display().to_string(),
            });
        }
        let raw = fs::read(&request.media_path).await?;
        let optimized = gramflow_media::optimize_image(&raw)?;

        let profile = &self.photo_retry;
        let mut last_error: Option<String> = None;
        for attempt in 1..=profile.max_attempts {
            match self
                .client
                .publish_photo(session, &optimized, &request.caption)
                .await
            {
                Ok(result) => {
                    info!(attempt, "photo upload succeeded");
                    return Ok(result);
                },
                Err(e) => {
                    warn!(
                        attempt,
                        max_attempts = profile.max_attempts,
                        profile = profile.name,
                        error = %e,
                        "photo upload attempt failed"
                    );
                    last_error = Some(e.to_string());
                    if attempt < profile.max_attempts
                        && let Some(pause) = profile.pause_between_attempts()
                    {
                        tokio::time::sleep(pause).await;
                    }
                },
            }
        }

        Err(PublishError::Upload {
            attempts: profile.max_attempts,
            last_error: last_error.unwrap_or_default(),
        })
    }

    async fn upload_video(
        &self,
        session: &PlatformSession,
        request: &PublishRequest,
    ) -> Result<Value, PublishError> {
        let cover = match &request.thumbnail_path {
            Some(path) => CoverSource::Provided(path.clone()),
            None => CoverSource::Derived(
                derive_thumbnail(&self.ffmpeg_binary, &request.media_path).await?,
            ),
        };

        let result = self.upload_video_once(session, request, &cover).await;
        remove_if_derived(&cover).await;
        result
    }

    async fn upload_video_once(
        &self,
        session: &PlatformSession,
        request: &PublishRequest,
        cover: &CoverSource,
    ) -> Result<Value, PublishError> {
        let video = fs::read(&request.media_path).await?;
        let cover_bytes = fs::read(cover.path()).await?;

        // Video uploads get exactly one attempt. Known asymmetry with the
        // photo path, kept as observed platform behavior.
        self.client
            .publish_video(session, &video, &cover_bytes, &request.caption)
            .await
            .map_err(|e| PublishError::Upload {
                attempts: VIDEO_UPLOAD.max_attempts,
                last_error: e.to_string(),
            })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        io::Cursor,
        sync::{
            Mutex,
            atomic::{AtomicU32, Ordering},
        },
    };

    use {
        async_trait::async_trait,
        serde_json::json,
        tempfile::TempDir,
    };

    use {
        super::*,
        crate::{
            platform::{PlatformError, PlatformResult},
            retry::RetryDelay,
        },
    };

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum PostLoginBehavior {
        Clean,
        BenignMiss,
        Broken,
    }

    struct ScriptedPlatform {
        login_ok: bool,
        /// Outcome per photo attempt; exhausted script means success.
        photo_script: Mutex<VecDeque<bool>>,
        video_ok: bool,
        post_login: PostLoginBehavior,
        photo_calls: AtomicU32,
        video_calls: AtomicU32,
        post_login_calls: AtomicU32,
    }

    impl ScriptedPlatform {
        fn new() -> Self {
            Self {
                login_ok: true,
                photo_script: Mutex::new(VecDeque::new()),
                video_ok: true,
                post_login: PostLoginBehavior::Clean,
                photo_calls: AtomicU32::new(0),
                video_calls: AtomicU32::new(0),
                post_login_calls: AtomicU32::new(0),
            }
        }

        fn with_photo_script(self, script: &[bool]) -> Self {
            *self.photo_script.lock().unwrap() = script.iter().copied().collect();
            self
        }
    }

    #[async_trait]
    impl PlatformClient for &ScriptedPlatform {
        fn open_session(&self, username: &str) -> PlatformSession {
            PlatformSession::for_username(username)
        }

        async fn pre_login_flow(&self, _session: &PlatformSession) -> PlatformResult<()> {
            Ok(())
        }

        async fn login(
            &self,
            session: &mut PlatformSession,
            credentials: &AccountCredentials,
        ) -> PlatformResult<Value> {
            if !self.login_ok {
                return Err(PlatformError::AuthRejected {
                    reason: "bad password".into(),
                });
            }
            session.auth_token = Some("tok".into());
            Ok(json!({ "username": credentials.username }))
        }

        async fn publish_photo(
            &self,
            _session: &PlatformSession,
            _photo: &[u8],
            _caption: &str,
        ) -> PlatformResult<Value> {
            self.photo_calls.fetch_add(1, Ordering::SeqCst);
            let ok = self.photo_script.lock().unwrap().pop_front().unwrap_or(true);
            if ok {
                Ok(json!({ "media_id": "m-1" }))
            } else {
                Err(PlatformError::Status {
                    operation: "publish photo".into(),
                    status: 500,
                    body: "transient upload failure".into(),
                })
            }
        }

        async fn publish_video(
            &self,
            _session: &PlatformSession,
            _video: &[u8],
            _cover: &[u8],
            _caption: &str,
        ) -> PlatformResult<Value> {
            self.video_calls.fetch_add(1, Ordering::SeqCst);
            if self.video_ok {
                Ok(json!({ "media_id": "v-1" }))
            } else {
                Err(PlatformError::Status {
                    operation: "publish video".into(),
                    status: 502,
                    body: "broken transcode".into(),
                })
            }
        }

        async fn post_login_flow(&self, _session: &PlatformSession) -> PlatformResult<()> {
            self.post_login_calls.fetch_add(1, Ordering::SeqCst);
            match self.post_login {
                PostLoginBehavior::Clean => Ok(()),
                PostLoginBehavior::BenignMiss => Err(PlatformError::NotFound {
                    resource: "/api/v1/fbsearch/suggested_searches/?type=users".into(),
                }),
                PostLoginBehavior::Broken => Err(PlatformError::Status {
                    operation: "post-login flow".into(),
                    status: 500,
                    body: "checkpoint".into(),
                }),
            }
        }
    }

    fn no_pause_retry() -> RetryProfile {
        RetryProfile {
            name: "photo-upload",
            max_attempts: 3,
            delay: RetryDelay::None,
        }
    }

    fn pipeline(platform: &ScriptedPlatform) -> PublishPipeline<&ScriptedPlatform> {
        PublishPipeline::new(platform).with_photo_retry(no_pause_retry())
    }

    fn credentials() -> AccountCredentials {
        AccountCredentials::new("somebrand", "hunter2")
    }

    fn write_png(dir: &TempDir) -> PathBuf {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            640,
            640,
            image::Rgb([120, 40, 40]),
        ));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        let path = dir.path().join("post.png");
        std::fs::write(&path, out.into_inner()).unwrap();
        path
    }

    fn image_request(media_path: PathBuf) -> PublishRequest {
        PublishRequest {
            media_path,
            media_kind: MediaKind::Image,
            caption: "spring sale".into(),
            thumbnail_path: None,
        }
    }

    #[tokio::test]
    async fn photo_succeeds_on_third_attempt() {
        let tmp = TempDir::new().unwrap();
        let platform = ScriptedPlatform::new().with_photo_script(&[false, false, true]);

        let outcome = pipeline(&platform)
            .publish(&image_request(write_png(&tmp)), &credentials())
            .await;

        assert!(outcome.success, "{}", outcome.message);
        assert_eq!(platform.photo_calls.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.platform_result.unwrap()["media_id"], "m-1");
    }

    #[tokio::test]
    async fn photo_fails_after_three_attempts_citing_last_error() {
        let tmp = TempDir::new().unwrap();
        let platform = ScriptedPlatform::new().with_photo_script(&[false, false, false]);

        let outcome = pipeline(&platform)
            .publish(&image_request(write_png(&tmp)), &credentials())
            .await;

        assert!(!outcome.success);
        assert_eq!(platform.photo_calls.load(Ordering::SeqCst), 3);
        assert!(outcome.message.contains("3 attempt"), "{}", outcome.message);
        assert!(
            outcome.message.contains("transient upload failure"),
            "{}",
            outcome.message
        );
    }

    #[tokio::test]
    async fn login_failure_aborts_without_uploading() {
        let tmp = TempDir::new().unwrap();
        let mut platform = ScriptedPlatform::new();
        platform.login_ok = false;

        let outcome = pipeline(&platform)
            .publish(&image_request(write_png(&tmp)), &credentials())
            .await;

        assert!(!outcome.success);
        assert!(outcome.message.contains("login failed"), "{}", outcome.message);
        assert_eq!(platform.photo_calls.load(Ordering::SeqCst), 0);
        // Cleanup still ran.
        assert_eq!(platform.post_login_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_media_file_is_reported_before_any_upload() {
        let platform = ScriptedPlatform::new();

        let outcome = pipeline(&platform)
            .publish(
                &image_request(PathBuf::from("/nonexistent/post.png")),
                &credentials(),
            )
            .await;

        assert!(!outcome.success);
        assert!(outcome.message.contains("not found"), "{}", outcome.message);
        assert_eq!(platform.photo_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn benign_post_login_error_keeps_success() {
        let tmp = TempDir::new().unwrap();
        let mut platform = ScriptedPlatform::new();
        platform.post_login = PostLoginBehavior::BenignMiss;

        let outcome = pipeline(&platform)
            .publish(&image_request(write_png(&tmp)), &credentials())
            .await;

        assert!(outcome.success);
        assert_eq!(platform.post_login_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unexpected_post_login_error_never_overrides_outcome() {
        let tmp = TempDir::new().unwrap();
        let mut platform = ScriptedPlatform::new();
        platform.post_login = PostLoginBehavior::Broken;

        let outcome = pipeline(&platform)
            .publish(&image_request(write_png(&tmp)), &credentials())
            .await;

        assert!(outcome.success);
    }

    #[tokio::test]
    async fn video_uploads_once_with_provided_cover() {
        let tmp = TempDir::new().unwrap();
        let video_path = tmp.path().join("clip.mp4");
        std::fs::write(&video_path, b"video bytes").unwrap();
        let cover_path = tmp.path().join("cover.jpg");
        std::fs::write(&cover_path, b"cover bytes").unwrap();

        let platform = ScriptedPlatform::new();
        let outcome = pipeline(&platform)
            .publish(
                &PublishRequest {
                    media_path: video_path,
                    media_kind: MediaKind::Video,
                    caption: "new clip".into(),
                    thumbnail_path: Some(cover_path.clone()),
                },
                &credentials(),
            )
            .await;

        assert!(outcome.success, "{}", outcome.message);
        assert_eq!(platform.video_calls.load(Ordering::SeqCst), 1);
        // A caller-provided cover is not ours to delete.
        assert!(cover_path.exists());
    }

    #[tokio::test]
    async fn video_failure_is_terminal_after_one_attempt() {
        let tmp = TempDir::new().unwrap();
        let video_path = tmp.path().join("clip.mp4");
        std::fs::write(&video_path, b"video bytes").unwrap();
        let cover_path = tmp.path().join("cover.jpg");
        std::fs::write(&cover_path, b"cover bytes").unwrap();

        let mut platform = ScriptedPlatform::new();
        platform.video_ok = false;

        let outcome = pipeline(&platform)
            .publish(
                &PublishRequest {
                    media_path: video_path,
                    media_kind: MediaKind::Video,
                    caption: "new clip".into(),
                    thumbnail_path: Some(cover_path),
                },
                &credentials(),
            )
            .await;

        assert!(!outcome.success);
        assert_eq!(platform.video_calls.load(Ordering::SeqCst), 1);
        assert!(
            outcome.message.contains("broken transcode"),
            "{}",
            outcome.message
        );
    }

    #[tokio::test]
    async fn video_thumbnail_derivation_failure_aborts() {
        let tmp = TempDir::new().unwrap();
        let video_path = tmp.path().join("clip.mp4");
        std::fs::write(&video_path, b"video bytes").unwrap();

        let platform = ScriptedPlatform::new();
        let outcome = PublishPipeline::new(&platform)
            .with_photo_retry(no_pause_retry())
            .with_ffmpeg_binary("definitely-not-ffmpeg")
            .publish(
                &PublishRequest {
                    media_path: video_path,
                    media_kind: MediaKind::Video,
                    caption: "new clip".into(),
                    thumbnail_path: None,
                },
                &credentials(),
            )
            .await;

        assert!(!outcome.success);
        assert!(outcome.message.contains("thumbnail"), "{}", outcome.message);
        assert_eq!(platform.video_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn derived_cover_is_deleted_provided_cover_is_kept() {
        let tmp = TempDir::new().unwrap();
        let derived_path = tmp.path().join("derived_thumbnail.jpg");
        std::fs::write(&derived_path, b"cover").unwrap();
        remove_if_derived(&CoverSource::Derived(derived_path.clone())).await;
        assert!(!derived_path.exists());

        let provided_path = tmp.path().join("provided.jpg");
        std::fs::write(&provided_path, b"cover").unwrap();
        remove_if_derived(&CoverSource::Provided(provided_path.clone())).await;
        assert!(provided_path.exists());
    }
}
