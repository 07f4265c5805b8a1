//! In-memory recorder.
//!
//! `MockDevice` keeps a whole disc directory in memory and answers every
//! transport command the way a real unit would: positions stay dense,
//! groups follow moved and deleted tracks, title storage and capacity are
//! limited. Clones share state, so a test can keep one clone for
//! inspection while another is owned by a [`TransportHandle`].
//!
//! [`TransportHandle`]: crate::TransportHandle

use crate::regroup::{self, GroupDef};
use async_trait::async_trait;
use md_core::titles::{sanitize_full_width_title, sanitize_half_width_title};
use md_core::{
    Capability, DeviceStatus, DeviceTransport, Disc, DiscTime, Encoding, Group, MdError,
    PlaybackState, ProgressFn, ReadProgress, Result, SeekTime, Track, TrackPosition,
    Wireformat, WriteProgress, FRAMES_PER_SECOND,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Half-width characters the directory holds across all track titles
pub const TRACK_TITLES_MAX_LENGTH: usize = 1700;

/// Capacity of a blank 80 minute disc, in frames
pub const DEFAULT_CAPACITY: u64 = 80 * 60 * FRAMES_PER_SECOND;

const UPLOAD_STEPS: u64 = 3;

/// How the listing command misbehaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingFault {
    /// The device refuses to read the directory
    Reject,
    /// The directory is unreadable until the title area is wiped
    Corrupt,
}

/// Failures to inject into the next commands
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Fail the upload with this 0-based ordinal, counted from device creation
    pub fail_upload_at: Option<usize>,
    pub listing: Option<ListingFault>,
    /// Refuse `next` and `previous`
    pub refuse_skip: bool,
    pub fail_status: bool,
}

/// One command received by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    DeviceName,
    Capabilities,
    ListContent,
    DeviceStatus,
    PrepareUpload,
    Upload { title: String, format: Wireformat },
    FinalizeUpload,
    Download(usize),
    MoveTrack { src: usize, dst: usize, update_groups: bool },
    RewriteGroups(usize),
    AddGroup { begin: usize, length: usize, name: String },
    DeleteGroup(usize),
    DeleteTracks(Vec<usize>),
    WipeDisc,
    WipeDiscTitleInfo,
    RenameGroup(usize, String),
    RenameTrack(usize, String),
    RenameDisc(String),
    EjectDisc,
    Play,
    Pause,
    Stop,
    Next,
    Previous,
    GotoTrack(usize),
    GotoTime(usize, SeekTime),
    Position,
}

impl DeviceCall {
    /// Whether the command changes the disc contents
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Upload { .. }
                | Self::MoveTrack { .. }
                | Self::RewriteGroups(_)
                | Self::AddGroup { .. }
                | Self::DeleteGroup(_)
                | Self::DeleteTracks(_)
                | Self::WipeDisc
                | Self::WipeDiscTitleInfo
                | Self::RenameGroup(..)
                | Self::RenameTrack(..)
                | Self::RenameDisc(_)
        )
    }
}

/// The persisted part of the device
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MockState {
    name: String,
    disc_present: bool,
    title: String,
    #[serde(default)]
    full_width_title: String,
    capacity: u64,
    tracks: Vec<Track>,
    groups: Vec<GroupDef>,
    status: DeviceStatus,
    capabilities: Vec<Capability>,
}

impl MockState {
    fn demo() -> Self {
        let minutes = |m: u64| m * 60 * FRAMES_PER_SECOND;
        let tracks = vec![
            Track::new(0, "Opening Theme", minutes(3), Encoding::Sp),
            Track::new(1, "Night Drive", minutes(5), Encoding::Sp),
            Track::new(2, "Harbour Lights", minutes(5), Encoding::Lp2),
            Track::new(3, "Long Way Home", minutes(5), Encoding::Lp2),
            Track::new(4, "Coda", minutes(5), Encoding::Sp).with_full_width_title("コーダ"),
        ];
        Self {
            groups: vec![GroupDef::new("Side A", vec![0, 1])],
            tracks,
            ..Self::blank()
        }
    }

    fn blank() -> Self {
        Self {
            name: "Reference MD Unit".to_string(),
            disc_present: true,
            title: String::new(),
            full_width_title: String::new(),
            capacity: DEFAULT_CAPACITY,
            tracks: Vec::new(),
            groups: Vec::new(),
            status: DeviceStatus::default(),
            capabilities: Capability::ALL.to_vec(),
        }
    }

    fn reindex(&mut self) {
        for (i, track) in self.tracks.iter_mut().enumerate() {
            track.index = i;
        }
    }

    fn disc(&self) -> Disc {
        let grouped: Vec<usize> = self.groups.iter().flat_map(|g| g.tracks.clone()).collect();
        let ungrouped = self
            .tracks
            .iter()
            .filter(|t| !grouped.contains(&t.index))
            .cloned()
            .collect();

        let mut groups = vec![Group::ungrouped(ungrouped)];
        groups.extend(
            self.groups
                .iter()
                .enumerate()
                .map(|(i, def)| def.to_group(i + 1, &self.tracks)),
        );

        Disc {
            title: self.title.clone(),
            full_width_title: self.full_width_title.clone(),
            capacity: self.capacity,
            write_protected: false,
            writable: true,
            groups,
        }
    }

    fn titles_length_without(&self, skip: Option<usize>) -> usize {
        self.tracks
            .iter()
            .filter(|t| Some(t.index) != skip)
            .map(|t| t.title.chars().count())
            .sum()
    }

    fn check_track(&self, index: usize) -> Result<()> {
        if index < self.tracks.len() {
            Ok(())
        } else {
            Err(MdError::rejected(format!("No track at position {}", index)))
        }
    }

    fn check_disc(&self) -> Result<()> {
        if self.disc_present {
            Ok(())
        } else {
            Err(MdError::transport("No disc loaded"))
        }
    }
}

#[derive(Debug)]
struct Inner {
    state: MockState,
    faults: Faults,
    calls: Vec<DeviceCall>,
    uploads: usize,
    audio: Vec<Option<Vec<u8>>>,
    path: Option<PathBuf>,
}

/// In-memory recorder, see the module docs
#[derive(Debug, Clone)]
pub struct MockDevice {
    inner: Arc<Mutex<Inner>>,
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDevice {
    /// A device holding a small demo disc
    pub fn new() -> Self {
        Self::from_state(MockState::demo(), None)
    }

    /// A device holding a blank disc
    pub fn blank() -> Self {
        Self::from_state(MockState::blank(), None)
    }

    /// A device holding `disc`. Track positions are renumbered densely.
    pub fn with_disc(disc: &Disc) -> Self {
        let mut state = MockState::blank();
        state.title = disc.title.clone();
        state.full_width_title = disc.full_width_title.clone();
        state.capacity = disc.capacity;

        let mut tracks: Vec<Track> = disc.tracks().cloned().collect();
        tracks.sort_by_key(|t| t.index);
        state.groups = disc
            .named_groups()
            .map(|g| GroupDef {
                title: g.title.clone().unwrap_or_default(),
                full_width_title: g.full_width_title.clone(),
                tracks: g
                    .tracks
                    .iter()
                    .filter_map(|t| tracks.iter().position(|s| s.index == t.index))
                    .collect(),
            })
            .collect();
        state.tracks = tracks;
        state.reindex();
        regroup::normalize(&mut state.groups);

        Self::from_state(state, None)
    }

    /// Load the device persisted at `path`, or start a demo disc there
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let state = match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No device state at {}, starting a demo disc", path.display());
                MockState::demo()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self::from_state(state, Some(path.to_path_buf())))
    }

    /// Create a fresh device persisted at `path`, replacing whatever is there
    pub async fn create(path: impl AsRef<Path>, blank: bool) -> Result<Self> {
        let state = if blank {
            MockState::blank()
        } else {
            MockState::demo()
        };
        let device = Self::from_state(state, Some(path.as_ref().to_path_buf()));
        device.persist().await?;
        Ok(device)
    }

    fn from_state(state: MockState, path: Option<PathBuf>) -> Self {
        let audio = vec![None; state.tracks.len()];
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state,
                faults: Faults::default(),
                calls: Vec::new(),
                uploads: 0,
                audio,
                path,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: DeviceCall) {
        self.lock().calls.push(call);
    }

    /// Write the state to the backing file, if any
    pub async fn persist(&self) -> Result<()> {
        let (path, json) = {
            let inner = self.lock();
            match &inner.path {
                Some(path) => (path.clone(), serde_json::to_vec_pretty(&inner.state)?),
                None => return Ok(()),
            }
        };
        tokio::fs::write(&path, json).await?;
        debug!("Device state saved to {}", path.display());
        Ok(())
    }

    /// Replace the injected faults
    pub fn set_faults(&self, faults: Faults) {
        self.lock().faults = faults;
    }

    /// Restrict the advertised capabilities
    pub fn set_capabilities(&self, capabilities: Vec<Capability>) {
        self.lock().state.capabilities = capabilities;
    }

    /// Current contents, bypassing the command log
    pub fn snapshot(&self) -> Disc {
        self.lock().state.disc()
    }

    /// Current transport state, bypassing the command log
    pub fn status(&self) -> DeviceStatus {
        self.lock().state.status.clone()
    }

    /// Every command received so far
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.lock().calls.clone()
    }

    /// Commands received so far that changed the disc
    pub fn mutations(&self) -> Vec<DeviceCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Apply a change to the state and persist it
    async fn mutate<T>(&self, call: DeviceCall, f: impl FnOnce(&mut Inner) -> Result<T>) -> Result<T> {
        let value = {
            let mut inner = self.lock();
            inner.calls.push(call);
            inner.state.check_disc()?;
            f(&mut *inner)?
        };
        self.persist().await?;
        Ok(value)
    }

    fn skip(&self, call: DeviceCall, forward: bool) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(call);
        if inner.faults.refuse_skip {
            return Err(MdError::rejected("Command not supported by this unit"));
        }
        let count = inner.state.tracks.len();
        if let Some(track) = inner.state.status.track {
            inner.state.status.track = Some(if forward {
                (track + 1).min(count.saturating_sub(1))
            } else {
                track.saturating_sub(1)
            });
        }
        Ok(())
    }

    fn set_state(&self, call: DeviceCall, state: PlaybackState) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(call);
        inner.state.check_disc()?;
        inner.state.status.state = state;
        Ok(())
    }
}

fn silence_for(track: &Track) -> Vec<u8> {
    let format = match track.encoding {
        Encoding::Sp => Wireformat::Sp,
        Encoding::Lp2 => Wireformat::Lp2,
        Encoding::Lp4 => Wireformat::Lp4,
    };
    let len = track.duration * format.bytes_per_second() / FRAMES_PER_SECOND;
    vec![0; len as usize]
}

#[async_trait]
impl DeviceTransport for MockDevice {
    async fn device_name(&mut self) -> Result<String> {
        let mut inner = self.lock();
        inner.calls.push(DeviceCall::DeviceName);
        Ok(inner.state.name.clone())
    }

    async fn capabilities(&mut self) -> Result<Vec<Capability>> {
        let mut inner = self.lock();
        inner.calls.push(DeviceCall::Capabilities);
        Ok(inner.state.capabilities.clone())
    }

    async fn list_content(&mut self) -> Result<Disc> {
        let mut inner = self.lock();
        inner.calls.push(DeviceCall::ListContent);
        inner.state.check_disc()?;
        match inner.faults.listing {
            Some(ListingFault::Reject) => Err(MdError::transport("Rejected: listing refused")),
            Some(ListingFault::Corrupt) => Err(MdError::CorruptedDirectory(
                "Title area checksum mismatch".to_string(),
            )),
            None => Ok(inner.state.disc()),
        }
    }

    async fn device_status(&mut self) -> Result<DeviceStatus> {
        let mut inner = self.lock();
        inner.calls.push(DeviceCall::DeviceStatus);
        if inner.faults.fail_status {
            return Err(MdError::transport("Status query timed out"));
        }
        Ok(inner.state.status.clone())
    }

    async fn prepare_upload(&mut self) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(DeviceCall::PrepareUpload);
        inner.state.check_disc()
    }

    async fn upload(
        &mut self,
        title: &str,
        full_width_title: &str,
        data: Vec<u8>,
        format: Wireformat,
        on_progress: &mut ProgressFn<'_, WriteProgress>,
    ) -> Result<()> {
        let total = data.len() as u64;
        on_progress(WriteProgress {
            written: 0,
            encrypted: 0,
            total,
        });

        let title = sanitize_half_width_title(title);
        let full_width_title = sanitize_full_width_title(full_width_title);
        let duration = total * FRAMES_PER_SECOND / format.bytes_per_second();

        {
            let mut inner = self.lock();
            inner.calls.push(DeviceCall::Upload {
                title: title.clone(),
                format,
            });
            inner.state.check_disc()?;

            let ordinal = inner.uploads;
            inner.uploads += 1;
            if inner.faults.fail_upload_at == Some(ordinal) {
                return Err(MdError::transport("Write failed: lost sync with the unit"));
            }
            if inner.state.titles_length_without(None) + title.chars().count()
                > TRACK_TITLES_MAX_LENGTH
            {
                return Err(MdError::transport("Track's title too long"));
            }
            if duration.div_ceil(format.multiplier()) > inner.state.disc().left() {
                return Err(MdError::transport("Not enough space left on the disc"));
            }
        }

        for step in 1..=UPLOAD_STEPS {
            tokio::task::yield_now().await;
            on_progress(WriteProgress {
                written: total * step / UPLOAD_STEPS,
                encrypted: total,
                total,
            });
        }

        {
            let mut inner = self.lock();
            let index = inner.state.tracks.len();
            let mut track = Track::new(index, title, duration, format.encoding());
            track.full_width_title = full_width_title;
            info!("Recorded track {} ({}, {} bytes)", index, format, total);
            inner.state.tracks.push(track);
            inner.audio.push(Some(data));
        }
        self.persist().await
    }

    async fn finalize_upload(&mut self) -> Result<()> {
        self.record(DeviceCall::FinalizeUpload);
        Ok(())
    }

    async fn download(
        &mut self,
        index: usize,
        on_progress: &mut ProgressFn<'_, ReadProgress>,
    ) -> Result<Vec<u8>> {
        let data = {
            let mut inner = self.lock();
            inner.calls.push(DeviceCall::Download(index));
            inner.state.check_disc()?;
            inner.state.check_track(index)?;
            match inner.audio.get(index).cloned().flatten() {
                Some(data) => data,
                None => silence_for(&inner.state.tracks[index]),
            }
        };

        let total = data.len() as u64;
        for step in 0..=UPLOAD_STEPS {
            on_progress(ReadProgress {
                read: total * step / UPLOAD_STEPS,
                total,
            });
        }
        Ok(data)
    }

    async fn move_track(&mut self, src: usize, dst: usize, update_groups: bool) -> Result<()> {
        self.mutate(
            DeviceCall::MoveTrack {
                src,
                dst,
                update_groups,
            },
            |inner| {
                inner.state.check_track(src)?;
                inner.state.check_track(dst)?;
                let track = inner.state.tracks.remove(src);
                inner.state.tracks.insert(dst, track);
                let audio = inner.audio.remove(src);
                inner.audio.insert(dst, audio);
                inner.state.reindex();
                if update_groups {
                    regroup::after_move(&mut inner.state.groups, src, dst);
                }
                Ok(())
            },
        )
        .await
    }

    async fn rewrite_groups(&mut self, groups: &[Group]) -> Result<()> {
        let defs: Vec<GroupDef> = groups
            .iter()
            .filter(|g| !g.is_ungrouped())
            .map(|g| GroupDef {
                title: g.title.clone().unwrap_or_default(),
                full_width_title: g.full_width_title.clone(),
                tracks: g.track_indices(),
            })
            .filter(|d| !d.tracks.is_empty())
            .collect();

        self.mutate(DeviceCall::RewriteGroups(defs.len()), move |inner| {
            regroup::validate(&defs, inner.state.tracks.len()).map_err(MdError::rejected)?;
            let mut defs = defs;
            defs.sort_by_key(|d| d.tracks.first().copied());
            inner.state.groups = defs;
            Ok(())
        })
        .await
    }

    async fn add_group(&mut self, begin: usize, length: usize, name: &str) -> Result<()> {
        let call = DeviceCall::AddGroup {
            begin,
            length,
            name: name.to_string(),
        };
        let name = sanitize_half_width_title(name);
        self.mutate(call, move |inner| {
            let end = begin + length;
            let taken = inner
                .state
                .groups
                .iter()
                .any(|g| g.tracks.iter().any(|&i| i >= begin && i < end));
            if length == 0 || end > inner.state.tracks.len() || taken {
                return Err(MdError::rejected("Invalid sequence of tracks!"));
            }
            inner.state.groups.push(GroupDef::new(name, (begin..end).collect()));
            inner.state.groups.sort_by_key(|d| d.tracks.first().copied());
            Ok(())
        })
        .await
    }

    async fn delete_group(&mut self, index: usize) -> Result<()> {
        self.mutate(DeviceCall::DeleteGroup(index), |inner| {
            if index == 0 || index > inner.state.groups.len() {
                return Err(MdError::rejected(format!("No group {}", index)));
            }
            inner.state.groups.remove(index - 1);
            Ok(())
        })
        .await
    }

    async fn delete_tracks(&mut self, indexes: &[usize]) -> Result<()> {
        let mut indexes = indexes.to_vec();
        indexes.sort_unstable_by(|a, b| b.cmp(a));
        indexes.dedup();

        self.mutate(DeviceCall::DeleteTracks(indexes.clone()), move |inner| {
            for &index in &indexes {
                inner.state.check_track(index)?;
            }
            for index in indexes {
                regroup::after_delete(&mut inner.state.groups, index);
                inner.state.tracks.remove(index);
                inner.audio.remove(index);
            }
            inner.state.reindex();
            Ok(())
        })
        .await
    }

    async fn wipe_disc(&mut self) -> Result<()> {
        self.mutate(DeviceCall::WipeDisc, |inner| {
            inner.state.tracks.clear();
            inner.audio.clear();
            inner.state.groups.clear();
            inner.state.title.clear();
            inner.state.full_width_title.clear();
            inner.faults.listing = None;
            Ok(())
        })
        .await
    }

    async fn wipe_disc_title_info(&mut self) -> Result<()> {
        self.mutate(DeviceCall::WipeDiscTitleInfo, |inner| {
            inner.state.groups.clear();
            inner.state.title.clear();
            inner.state.full_width_title.clear();
            if inner.faults.listing == Some(ListingFault::Corrupt) {
                inner.faults.listing = None;
            }
            Ok(())
        })
        .await
    }

    async fn rename_group(
        &mut self,
        index: usize,
        title: &str,
        full_width_title: Option<&str>,
    ) -> Result<()> {
        let title = sanitize_half_width_title(title);
        let full_width_title = full_width_title.map(sanitize_full_width_title);
        self.mutate(DeviceCall::RenameGroup(index, title.clone()), move |inner| {
            let def = index
                .checked_sub(1)
                .and_then(|i| inner.state.groups.get_mut(i))
                .ok_or_else(|| MdError::rejected(format!("No group {}", index)))?;
            def.title = title;
            if let Some(fw) = full_width_title {
                def.full_width_title = Some(fw);
            }
            Ok(())
        })
        .await
    }

    async fn rename_track(
        &mut self,
        index: usize,
        title: &str,
        full_width_title: Option<&str>,
    ) -> Result<()> {
        let title = sanitize_half_width_title(title);
        let full_width_title = full_width_title.map(sanitize_full_width_title);
        self.mutate(DeviceCall::RenameTrack(index, title.clone()), move |inner| {
            inner.state.check_track(index)?;
            if inner.state.titles_length_without(Some(index)) + title.chars().count()
                > TRACK_TITLES_MAX_LENGTH
            {
                return Err(MdError::transport("Track's title too long"));
            }
            let track = &mut inner.state.tracks[index];
            track.title = title;
            if let Some(fw) = full_width_title {
                track.full_width_title = fw;
            }
            Ok(())
        })
        .await
    }

    async fn rename_disc(&mut self, title: &str, full_width_title: Option<&str>) -> Result<()> {
        let title = sanitize_half_width_title(title);
        let full_width_title = full_width_title.map(sanitize_full_width_title);
        self.mutate(DeviceCall::RenameDisc(title.clone()), move |inner| {
            inner.state.title = title;
            if let Some(fw) = full_width_title {
                inner.state.full_width_title = fw;
            }
            Ok(())
        })
        .await
    }

    async fn eject_disc(&mut self) -> Result<()> {
        {
            let mut inner = self.lock();
            inner.calls.push(DeviceCall::EjectDisc);
            inner.state.check_disc()?;
            inner.state.disc_present = false;
            inner.state.status = DeviceStatus {
                disc_present: false,
                track: None,
                time: None,
                state: PlaybackState::NoDisc,
            };
        }
        info!("Disc ejected");
        self.persist().await
    }

    async fn play(&mut self) -> Result<()> {
        self.set_state(DeviceCall::Play, PlaybackState::Playing)
    }

    async fn pause(&mut self) -> Result<()> {
        self.set_state(DeviceCall::Pause, PlaybackState::Paused)
    }

    async fn stop(&mut self) -> Result<()> {
        self.set_state(DeviceCall::Stop, PlaybackState::Ready)
    }

    async fn next(&mut self) -> Result<()> {
        self.skip(DeviceCall::Next, true)
    }

    async fn previous(&mut self) -> Result<()> {
        self.skip(DeviceCall::Previous, false)
    }

    async fn goto_track(&mut self, index: usize) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(DeviceCall::GotoTrack(index));
        inner.state.check_track(index)?;
        inner.state.status.track = Some(index);
        inner.state.status.time = Some(DiscTime::default());
        Ok(())
    }

    async fn goto_time(&mut self, index: usize, time: SeekTime) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(DeviceCall::GotoTime(index, time));
        inner.state.check_track(index)?;
        inner.state.status.track = Some(index);
        inner.state.status.time = Some(DiscTime {
            minute: time.hour * 60 + time.minute,
            second: time.second,
            frame: time.frame,
        });
        Ok(())
    }

    async fn position(&mut self) -> Result<Option<TrackPosition>> {
        let mut inner = self.lock();
        inner.calls.push(DeviceCall::Position);
        let status = &inner.state.status;
        Ok(match (status.track, status.time) {
            (Some(track), Some(time)) => Some(TrackPosition {
                track,
                hour: time.minute / 60,
                minute: time.minute % 60,
                second: time.second,
                frame: time.frame,
            }),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_demo_listing() {
        let mut device = MockDevice::new();
        let disc = device.list_content().await.unwrap();

        assert_eq!(disc.track_count(), 5);
        assert!(disc.groups[0].is_ungrouped());
        assert_eq!(disc.groups[1].title.as_deref(), Some("Side A"));
        assert_eq!(disc.groups[1].index, 1);
        assert_eq!(disc.groups[1].track_indices(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_upload_appends_ungrouped_track() {
        let mut device = MockDevice::blank();
        let mut seen = Vec::new();
        let data = vec![0u8; Wireformat::Lp2.bytes_per_second() as usize * 10];

        device
            .upload("New", "", data, Wireformat::Lp2, &mut |p| seen.push(p))
            .await
            .unwrap();

        let disc = device.snapshot();
        let track = disc.track(0).unwrap();
        assert_eq!(track.title, "New");
        assert_eq!(track.encoding, Encoding::Lp2);
        assert_eq!(track.duration, 10 * FRAMES_PER_SECOND);
        assert_eq!(seen.first().map(|p| p.written), Some(0));
        assert_eq!(seen.last().map(|p| p.written), seen.last().map(|p| p.total));
    }

    #[tokio::test]
    async fn test_upload_rejects_when_disc_full() {
        let mut device = MockDevice::with_disc(&Disc::new("", 5 * FRAMES_PER_SECOND));
        let data = vec![0u8; Wireformat::Sp.bytes_per_second() as usize * 10];

        let err = device
            .upload("Too long", "", data, Wireformat::Sp, &mut |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, MdError::Transport(_)));
        assert_eq!(device.snapshot().track_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_rejects_when_titles_full() {
        let mut device = MockDevice::blank();
        let long: String = "x".repeat(TRACK_TITLES_MAX_LENGTH);
        device
            .upload(&long, "", Vec::new(), Wireformat::Sp, &mut |_| {})
            .await
            .unwrap();

        assert!(device
            .upload("y", "", Vec::new(), Wireformat::Sp, &mut |_| {})
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_injected_upload_failure() {
        let mut device = MockDevice::blank();
        device.set_faults(Faults {
            fail_upload_at: Some(1),
            ..Faults::default()
        });

        assert!(device
            .upload("a", "", Vec::new(), Wireformat::Sp, &mut |_| {})
            .await
            .is_ok());
        assert!(device
            .upload("b", "", Vec::new(), Wireformat::Sp, &mut |_| {})
            .await
            .is_err());
        assert_eq!(device.snapshot().track_count(), 1);
    }

    #[tokio::test]
    async fn test_move_with_group_update() {
        let mut device = MockDevice::new();
        device.move_track(0, 3, true).await.unwrap();

        let disc = device.snapshot();
        assert_eq!(disc.track(3).unwrap().title, "Opening Theme");
        assert_eq!(disc.track(0).unwrap().title, "Night Drive");
        assert_eq!(disc.groups[1].track_indices(), vec![0]);
    }

    #[tokio::test]
    async fn test_move_without_group_update_leaves_ranges() {
        let mut device = MockDevice::new();
        device.move_track(4, 0, false).await.unwrap();

        let disc = device.snapshot();
        assert_eq!(disc.track(0).unwrap().title, "Coda");
        assert_eq!(disc.groups[1].track_indices(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_add_group_requires_free_tracks() {
        let mut device = MockDevice::new();

        let err = device.add_group(1, 2, "Overlap").await.unwrap_err();
        assert!(err.to_string().contains("Invalid sequence"));

        device.add_group(2, 3, "Side B").await.unwrap();
        let disc = device.snapshot();
        assert_eq!(disc.groups[2].title.as_deref(), Some("Side B"));
        assert_eq!(disc.groups[2].index, 2);
        assert!(disc.groups[0].tracks.is_empty());
    }

    #[tokio::test]
    async fn test_delete_tracks_keeps_indices_dense() {
        let mut device = MockDevice::new();
        device.delete_tracks(&[3, 0]).await.unwrap();

        let disc = device.snapshot();
        let mut indices: Vec<usize> = disc.tracks().map(|t| t.index).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(disc.groups[1].track_indices(), vec![0]);
    }

    #[tokio::test]
    async fn test_corrupt_listing_clears_after_title_wipe() {
        let mut device = MockDevice::new();
        device.set_faults(Faults {
            listing: Some(ListingFault::Corrupt),
            ..Faults::default()
        });

        assert!(device.list_content().await.is_err());
        device.wipe_disc_title_info().await.unwrap();
        let disc = device.list_content().await.unwrap();
        assert_eq!(disc.track_count(), 5);
        assert_eq!(disc.named_groups().count(), 0);
    }

    #[tokio::test]
    async fn test_rejected_listing_is_a_rejection() {
        let mut device = MockDevice::new();
        device.set_faults(Faults {
            listing: Some(ListingFault::Reject),
            ..Faults::default()
        });
        assert!(device.list_content().await.unwrap_err().is_rejection());
    }

    #[tokio::test]
    async fn test_skip_stays_on_disc() {
        let mut device = MockDevice::new();
        device.previous().await.unwrap();
        assert_eq!(device.status().track, Some(0));

        device.goto_track(4).await.unwrap();
        device.next().await.unwrap();
        assert_eq!(device.status().track, Some(4));
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.json");

        let mut device = MockDevice::open(&path).await.unwrap();
        device.rename_disc("Persisted", None).await.unwrap();

        let mut reopened = MockDevice::open(&path).await.unwrap();
        assert_eq!(reopened.list_content().await.unwrap().title, "Persisted");
    }
}
