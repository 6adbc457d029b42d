use crate::analysis::{MediaInfo, MediaTrack, UNDETERMINED_LANGUAGE};

/// Stream indices to map into the output, besides the first video stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackSelection {
    pub audio: Vec<usize>,
    pub subtitles: Vec<usize>,
}

fn is_preferred(track: &MediaTrack, preferred: &[String]) -> bool {
    preferred
        .iter()
        .any(|language| language.eq_ignore_ascii_case(&track.language))
}

/// True when no audio track with a known language is in `preferred`.
pub fn is_foreign(media: &MediaInfo, preferred: &[String]) -> bool {
    media
        .audio_tracks
        .iter()
        .filter(|track| track.language != UNDETERMINED_LANGUAGE)
        .all(|track| !is_preferred(track, preferred))
}

/// Picks audio and subtitle tracks by language preference.
///
/// Foreign sources keep their first (original) audio track plus the first
/// preferred dub, if any. Otherwise only the first preferred audio track is
/// kept. At most one preferred subtitle track is kept either way.
pub fn select_tracks(media: &MediaInfo, preferred: &[String]) -> TrackSelection {
    let mut selection = TrackSelection::default();
    let first_preferred_audio = media
        .audio_tracks
        .iter()
        .find(|track| is_preferred(track, preferred))
        .map(|track| track.index);

    if is_foreign(media, preferred) {
        if let Some(original) = media.audio_tracks.first() {
            selection.audio.push(original.index);
        }
        if let Some(dub) = first_preferred_audio.filter(|dub| !selection.audio.contains(dub)) {
            selection.audio.push(dub);
        }
    } else if let Some(audio) = first_preferred_audio {
        selection.audio.push(audio);
    }

    if let Some(subtitle) = media
        .subtitle_tracks
        .iter()
        .find(|track| is_preferred(track, preferred))
    {
        selection.subtitles.push(subtitle.index);
    }

    selection
}
