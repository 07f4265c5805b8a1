/// Audio export through external encoders
///
/// SP tracks are raw 16 bit big-endian PCM produced by ffmpeg. LP tracks are
/// ATRAC3 frames: ffmpeg decodes to a WAV file, atracdenc encodes it to an
/// OMA file and the container header is stripped.
use async_trait::async_trait;
use md_core::{AudioExport, MdError, Result, Wireformat};
use md_upload::{detect_source, SourceKind};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CommandExporter {
    ffmpeg_path: PathBuf,
    atracdenc_path: PathBuf,
    source: Option<PathBuf>,
}

impl CommandExporter {
    pub fn new(ffmpeg_path: PathBuf, atracdenc_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            atracdenc_path,
            source: None,
        }
    }

    fn source(&self) -> Result<&Path> {
        self.source
            .as_deref()
            .ok_or_else(|| MdError::export("No source prepared"))
    }

    async fn run(&self, program: &Path, args: Vec<OsString>) -> Result<Vec<u8>> {
        debug!("Running {} {:?}", program.display(), args);
        let output = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| MdError::export(format!("Cannot run {}: {}", program.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MdError::export(format!(
                "{} failed: {}",
                program.display(),
                stderr.trim()
            )));
        }
        Ok(output.stdout)
    }

    async fn export_pcm(&self, source: &Path) -> Result<Vec<u8>> {
        self.run(&self.ffmpeg_path, pcm_args(source)).await
    }

    async fn export_atrac(&self, source: &Path, format: Wireformat) -> Result<Vec<u8>> {
        let bitrate = atrac_bitrate(format)
            .ok_or_else(|| MdError::export(format!("{} is not an ATRAC3 format", format)))?;

        let work = tempfile::tempdir()?;
        let wav = work.path().join("decoded.wav");
        let oma = work.path().join("encoded.oma");

        self.run(&self.ffmpeg_path, wav_args(source, &wav)).await?;
        self.run(&self.atracdenc_path, atracdenc_args(&wav, &oma, bitrate))
            .await?;

        let encoded = tokio::fs::read(&oma).await?;
        match detect_source(&encoded) {
            Ok(SourceKind::PreEncoded { bytes_to_skip, .. }) => {
                Ok(encoded.get(bytes_to_skip..).unwrap_or_default().to_vec())
            }
            Ok(SourceKind::Encode) => Err(MdError::export("Encoder produced no ATRAC3 stream")),
            Err(e) => Err(MdError::export(e.to_string())),
        }
    }
}

#[async_trait]
impl AudioExport for CommandExporter {
    async fn prepare(&mut self, source: &Path) -> Result<()> {
        if !tokio::fs::try_exists(source).await? {
            return Err(MdError::export(format!(
                "{} does not exist",
                source.display()
            )));
        }
        self.source = Some(source.to_path_buf());
        Ok(())
    }

    async fn export(&mut self, format: Wireformat) -> Result<Vec<u8>> {
        let source = self.source()?.to_path_buf();
        match format {
            Wireformat::Sp => self.export_pcm(&source).await,
            Wireformat::Lp2 | Wireformat::Lp105 | Wireformat::Lp4 => {
                self.export_atrac(&source, format).await
            }
        }
    }
}

/// atracdenc bitrate in kbps for an ATRAC3 wire format
pub fn atrac_bitrate(format: Wireformat) -> Option<u32> {
    match format {
        Wireformat::Sp => None,
        Wireformat::Lp2 => Some(132),
        Wireformat::Lp105 => Some(105),
        Wireformat::Lp4 => Some(66),
    }
}

fn decode_args(source: &Path) -> Vec<OsString> {
    vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-i".into(),
        source.into(),
        "-ar".into(),
        "44100".into(),
        "-ac".into(),
        "2".into(),
    ]
}

/// Raw big-endian PCM on stdout
pub fn pcm_args(source: &Path) -> Vec<OsString> {
    let mut args = decode_args(source);
    args.extend(["-f", "s16be", "pipe:1"].map(OsString::from));
    args
}

/// 16 bit WAV file, the input atracdenc expects
pub fn wav_args(source: &Path, output: &Path) -> Vec<OsString> {
    let mut args = decode_args(source);
    args.extend(["-c:a", "pcm_s16le", "-y"].map(OsString::from));
    args.push(output.into());
    args
}

pub fn atracdenc_args(input: &Path, output: &Path, bitrate: u32) -> Vec<OsString> {
    vec![
        "-e".into(),
        "atrac3".into(),
        "-i".into(),
        input.into(),
        "-o".into(),
        output.into(),
        "--bitrate".into(),
        bitrate.to_string().into(),
    ]
}
