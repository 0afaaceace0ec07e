//! Unit tests for event decoding.

use rstest::rstest;

use super::{payload::*, *};

fn frame(context: &str, json: &str) -> Frame { Frame::new(context, json.as_bytes().to_vec()) }

#[test]
fn every_kind_round_trips_through_its_context() {
    for kind in EventKind::ALL {
        assert_eq!(EventKind::from_context(kind.context()), Some(*kind));
    }
}

fn sample_events() -> Vec<Event> {
    vec![
        Event::Ping,
        Event::Pong,
        Event::NowPlayingCover(CoverPayload {
            status: 1,
            cover: "iVBORw0KGgo=".into(),
        }),
        Event::NowPlayingLfmRating(LfmRating::Love),
        Event::NowPlayingLfmRating(LfmRating::Ban),
        Event::NowPlayingLfmRating(LfmRating::Normal),
        Event::NowPlayingListMove(TrackMoved {
            from: 3,
            to: 0,
            success: true,
        }),
        Event::NowPlayingListRemove(TrackRemoved {
            index: 7,
            success: false,
        }),
        Event::NowPlayingListPlay(true),
        Event::NowPlayingLyrics(LyricsPayload {
            status: 200,
            lyrics: "Oh sinnerman".into(),
        }),
        Event::NowPlayingPosition(Position {
            current: 61_000,
            total: 245_000,
        }),
        Event::NowPlayingRating(Rating("4.5".into())),
        Event::NowPlayingRating(Rating::default()),
        Event::NowPlayingTrack(TrackInfo {
            artist: "Nina Simone".into(),
            title: "Sinnerman".into(),
            album: "Pastel Blues".into(),
            year: "1965".into(),
            path: String::new(),
        }),
        Event::PlayerMute(true),
        Event::PlayerNext(true),
        Event::PlayerPrevious(false),
        Event::PlayerRepeat(RepeatMode::None),
        Event::PlayerRepeat(RepeatMode::All),
        Event::PlayerRepeat(RepeatMode::One),
        Event::PlayerScrobble(false),
        Event::PlayerShuffle(ShuffleMode::Off),
        Event::PlayerShuffle(ShuffleMode::Shuffle),
        Event::PlayerShuffle(ShuffleMode::AutoDj),
        Event::PlayerState(PlayState::Playing),
        Event::PlayerState(PlayState::Paused),
        Event::PlayerState(PlayState::Stopped),
        Event::PlayerState(PlayState::Undefined),
        Event::PlayerStatus(PlayerStatus {
            mute: false,
            repeat: RepeatMode::All,
            shuffle: ShuffleMode::AutoDj,
            scrobbler: true,
            state: PlayState::Undefined,
            volume: 35,
        }),
        Event::PlayerVolume(0),
        Event::PlayerVolume(100),
        Event::PluginVersion("1.4.1".into()),
        Event::ProtocolTag(4),
    ]
}

#[test]
fn samples_cover_every_kind() {
    let kinds: std::collections::BTreeSet<_> = sample_events().iter().map(Event::kind).collect();
    let all: std::collections::BTreeSet<_> = EventKind::ALL.iter().copied().collect();
    assert_eq!(kinds, all);
}

#[test]
fn every_event_decodes_to_itself() {
    for event in sample_events() {
        let frame = event.to_frame().expect("encode event");
        assert_eq!(frame.context(), event.kind().context());
        assert_eq!(
            EventRouter.decode(&frame).expect("decode event"),
            event,
            "context {}",
            frame.context()
        );
    }
}

#[test]
fn decodes_plugin_status_message() {
    let json = r#"{"playermute":true,"playerrepeat":"one","playershuffle":"shuffle",
        "scrobbler":false,"playerstate":"playing","playervolume":72}"#;
    let event = EventRouter
        .decode(&frame("playerstatus", json))
        .expect("status decodes");
    let Event::PlayerStatus(status) = event else {
        panic!("expected player status, got {event:?}");
    };
    assert!(status.mute);
    assert_eq!(status.repeat, RepeatMode::One);
    assert_eq!(status.shuffle, ShuffleMode::Shuffle);
    assert_eq!(status.state, PlayState::Playing);
    assert_eq!(status.volume, 72);
}

#[rstest]
#[case("true", ShuffleMode::Shuffle)]
#[case("false", ShuffleMode::Off)]
#[case("\"autodj\"", ShuffleMode::AutoDj)]
#[case("\"off\"", ShuffleMode::Off)]
fn shuffle_accepts_flag_and_mode(#[case] json: &str, #[case] expected: ShuffleMode) {
    let event = EventRouter
        .decode(&frame("playershuffle", json))
        .expect("shuffle decodes");
    assert_eq!(event, Event::PlayerShuffle(expected));
}

#[test]
fn unknown_play_state_maps_to_undefined() {
    let event = EventRouter
        .decode(&frame("playerstate", "\"buffering\""))
        .expect("state decodes");
    assert_eq!(event, Event::PlayerState(PlayState::Undefined));
}

#[test]
fn unit_kinds_ignore_payload() {
    assert_eq!(
        EventRouter.decode(&frame("ping", "")).expect("empty ping"),
        Event::Ping
    );
    assert_eq!(
        EventRouter
            .decode(&frame("pong", "\"\""))
            .expect("pong with body"),
        Event::Pong
    );
}

#[test]
fn unknown_context_is_rejected() {
    let err = EventRouter
        .decode(&frame("librarybrowseartists", "[]"))
        .expect_err("context is not dispatched");
    assert!(matches!(
        err,
        DecodeError::UnknownEventKind { ref context } if context == "librarybrowseartists"
    ));
}

#[rstest]
#[case("playervolume", "\"loud\"")]
#[case("playervolume", "")]
#[case("nowplayingposition", "{\"current\":1}")]
#[case("nowplayingtrack", "{not json")]
fn mismatched_payload_is_malformed(#[case] context: &str, #[case] json: &str) {
    let err = EventRouter
        .decode(&frame(context, json))
        .expect_err("payload does not fit");
    assert!(matches!(
        err,
        DecodeError::MalformedPayload { kind, .. } if kind.context() == context
    ));
}

#[rstest]
#[case("4.5", Some(4.5))]
#[case("", None)]
#[case("n/a", None)]
fn rating_value_parses_when_present(#[case] raw: &str, #[case] expected: Option<f32>) {
    assert_eq!(Rating(raw.to_owned()).value(), expected);
}
