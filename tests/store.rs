use std::rc::Rc;

use repertoire_manager::db::{
    self, open_database, BandService, ChangeKind, MoveDirection, RepertoireService, Scope,
};
use repertoire_manager::{ChangeFeed, MusicalKey, SongFields, SqliteStore};

fn store() -> (SqliteStore, i64, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let conn = Rc::new(open_database(&dir.path().join("store.sqlite")).unwrap());
    let owner = db::create_user(&conn, "lee@example.com", "Lee", "salt$hash", true)
        .unwrap()
        .id;
    (SqliteStore::new(conn, ChangeFeed::new()), owner, dir)
}

fn titles(store: &SqliteStore, repertoire_id: i64) -> Vec<String> {
    store
        .list_songs(repertoire_id)
        .unwrap()
        .into_iter()
        .map(|song| song.title)
        .collect()
}

#[test]
fn songs_get_consecutive_positions_and_compact_after_delete() {
    let (store, owner, _dir) = store();
    let repertoire = store.create_repertoire("Wedding", None, owner).unwrap();
    let ids: Vec<i64> = ["First dance", "Cake", "Last call"]
        .into_iter()
        .map(|title| {
            store
                .create_song(repertoire.id, &SongFields::titled(title))
                .unwrap()
                .id
        })
        .collect();

    let positions: Vec<i64> = store
        .list_songs(repertoire.id)
        .unwrap()
        .iter()
        .map(|song| song.position)
        .collect();
    assert_eq!(positions, vec![0, 1, 2]);

    store.delete_song(ids[1]).unwrap();
    let songs = store.list_songs(repertoire.id).unwrap();
    assert_eq!(
        songs.iter().map(|song| song.position).collect::<Vec<_>>(),
        vec![0, 1]
    );
    assert_eq!(titles(&store, repertoire.id), vec!["First dance", "Last call"]);
}

#[test]
fn moving_songs_swaps_neighbours_and_stops_at_the_ends() {
    let (store, owner, _dir) = store();
    let repertoire = store.create_repertoire("Pub", None, owner).unwrap();
    let first = store
        .create_song(repertoire.id, &SongFields::titled("A"))
        .unwrap();
    let second = store
        .create_song(repertoire.id, &SongFields::titled("B"))
        .unwrap();

    assert!(!store.move_song(first.id, MoveDirection::Up).unwrap());
    assert!(store.move_song(second.id, MoveDirection::Up).unwrap());
    assert_eq!(titles(&store, repertoire.id), vec!["B", "A"]);
    assert!(!store.move_song(first.id, MoveDirection::Down).unwrap());
}

#[test]
fn song_fields_round_trip_through_the_database() {
    let (store, owner, _dir) = store();
    let repertoire = store.create_repertoire("Jazz", Some("late set"), owner).unwrap();
    let fields = SongFields {
        title: "Autumn Leaves".into(),
        artist: Some("Kosma".into()),
        key: Some(MusicalKey::GMinor),
        chord_text: Some("Cm7 F7\nBbmaj7 Ebmaj7".into()),
        notes: Some("brushes".into()),
    };
    let song = store.create_song(repertoire.id, &fields).unwrap();

    let stored = &store.list_songs(repertoire.id).unwrap()[0];
    assert_eq!(stored.id, song.id);
    assert_eq!(stored.key, Some(MusicalKey::GMinor));
    assert_eq!(stored.chord_text.as_deref(), Some("Cm7 F7\nBbmaj7 Ebmaj7"));
    assert_eq!(stored.display_title(), "Autumn Leaves - Kosma");
}

#[test]
fn repertoires_list_newest_first_and_delete_cascades() {
    let (store, owner, _dir) = store();
    let older = store.create_repertoire("Older", None, owner).unwrap();
    let newer = store.create_repertoire("Newer", None, owner).unwrap();
    store
        .create_song(older.id, &SongFields::titled("Only"))
        .unwrap();

    let names: Vec<String> = store
        .list_repertoires(owner)
        .unwrap()
        .into_iter()
        .map(|repertoire| repertoire.name)
        .collect();
    assert_eq!(names, vec!["Newer", "Older"]);

    store.delete_repertoire(older.id).unwrap();
    assert!(store.list_songs(older.id).unwrap().is_empty());
    let remaining = store.list_repertoires(owner).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, newer.id);
}

#[test]
fn repertoires_are_scoped_to_their_owner() {
    let (store, owner, _dir) = store();
    let other = db::create_user(store.connection(), "kim@example.com", "Kim", "s$h", true)
        .unwrap()
        .id;
    store.create_repertoire("Mine", None, owner).unwrap();
    assert!(store.list_repertoires(other).unwrap().is_empty());
}

#[test]
fn subscribers_hear_only_their_scope() {
    let (store, owner, _dir) = store();
    let repertoires = store.subscribe(Scope::Repertoires { owner_id: owner });
    let repertoire = store.create_repertoire("Tour", None, owner).unwrap();
    let songs = store.subscribe(Scope::Songs {
        repertoire_id: repertoire.id,
    });

    store
        .create_song(repertoire.id, &SongFields::titled("Opener"))
        .unwrap();

    let changes = repertoires.drain();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].kind, ChangeKind::Added);
    assert_eq!(changes[0].id, repertoire.id);

    let changes = songs.drain();
    assert_eq!(changes.len(), 1);
    assert!(songs.drain().is_empty());
}

#[test]
fn dropped_subscription_stops_receiving() {
    let (store, owner, _dir) = store();
    let subscription = store.subscribe(Scope::Repertoires { owner_id: owner });
    assert_eq!(store.feed().subscriber_count(), 1);
    drop(subscription);
    assert_eq!(store.feed().subscriber_count(), 0);

    store.create_repertoire("Quiet", None, owner).unwrap();
    assert_eq!(store.feed().subscriber_count(), 0);
}

#[test]
fn band_members_follow_the_band() {
    let (store, owner, _dir) = store();
    assert!(store.find_band(owner).unwrap().is_none());

    let band = store.save_band(owner, "The Regulars").unwrap();
    let renamed = store.save_band(owner, "The Irregulars").unwrap();
    assert_eq!(band.id, renamed.id);

    let updates = store.subscribe_band(owner);
    store.add_member(band.id, "Sam", "Drums").unwrap();
    store.add_member(band.id, "Alex", "Bass").unwrap();
    assert_eq!(updates.drain().len(), 2);
    assert_eq!(store.list_members(band.id).unwrap().len(), 2);

    store.delete_band(band.id).unwrap();
    assert!(store.find_band(owner).unwrap().is_none());
    assert!(store.list_members(band.id).unwrap().is_empty());
}
