/// Property tests for drag-and-drop planning
use md_core::views::sorted_tracks;
use md_core::{Disc, Encoding, Group, Track};
use md_core::views::grouped_tracks;
use md_editor::{plan_drag_drop, DiscEditor, EditorSettings, FixedAnswer, ListPosition};
use md_transport::{MockDevice, TransportHandle};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

fn track(i: usize) -> Track {
    Track::new(i, format!("T{i}"), 512, Encoding::Sp)
}

fn disc(ungrouped: usize, total: usize) -> Disc {
    let mut groups = vec![Group::ungrouped((0..ungrouped).map(track).collect())];
    if total > ungrouped {
        groups.push(Group::named(1, "Album", (ungrouped..total).map(track).collect()));
    }
    Disc::new("d", 80 * 60 * 512).with_groups(groups)
}

/// Ungrouped runs interleaved with named groups: `(run, group)` pairs
/// followed by a trailing ungrouped run
fn layered_disc(segments: &[(usize, usize)], trailing: usize) -> Disc {
    let mut next = 0;
    let mut ungrouped = Vec::new();
    let mut named = Vec::new();
    for (n, &(run, length)) in segments.iter().enumerate() {
        ungrouped.extend((next..next + run).map(track));
        next += run;
        named.push(Group::named(
            n + 1,
            format!("G{}", n + 1),
            (next..next + length).map(track).collect(),
        ));
        next += length;
    }
    ungrouped.extend((next..next + trailing).map(track));

    let mut groups = vec![Group::ungrouped(ungrouped)];
    groups.extend(named);
    Disc::new("d", 80 * 60 * 512).with_groups(groups)
}

/// Titles in list order plus named-group membership, as the listing shows them
fn visual(lists: &[Group]) -> (Vec<String>, BTreeMap<String, Vec<String>>) {
    let order = lists
        .iter()
        .flat_map(|g| g.tracks.iter().map(|t| t.title.clone()))
        .collect();
    let members = lists
        .iter()
        .filter_map(|g| {
            let name = g.title.clone()?;
            (!g.tracks.is_empty())
                .then(|| (name, g.tracks.iter().map(|t| t.title.clone()).collect()))
        })
        .collect();
    (order, members)
}

fn position() -> impl Strategy<Value = ListPosition> {
    (0usize..4, 0usize..9).prop_map(|(list, index)| ListPosition::new(list, index))
}

proptest! {
    #[test]
    fn plans_match_a_single_physical_move(
        (total, ungrouped) in (1usize..8).prop_flat_map(|n| (Just(n), 0..=n)),
        source in position(),
        target in position(),
    ) {
        let disc = disc(ungrouped, total);
        let plan = match plan_drag_drop(&disc, source, target) {
            Ok(Some(plan)) => plan,
            _ => return Ok(()),
        };

        let layout = Disc::new("d", 0).with_groups(plan.groups.clone());
        let mut indexes: Vec<usize> = layout.tracks().map(|t| t.index).collect();
        indexes.sort_unstable();
        prop_assert_eq!(indexes, (0..total).collect::<Vec<_>>());

        for group in layout.named_groups() {
            prop_assert!(group.is_contiguous());
        }

        let mut expected: Vec<String> = (0..total).map(|i| format!("T{i}")).collect();
        if let Some((from, to)) = plan.track_move {
            let moved = expected.remove(from);
            expected.insert(to, moved);
        }
        let actual: Vec<String> = sorted_tracks(&layout).into_iter().map(|t| t.title).collect();
        prop_assert_eq!(actual, expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn device_matches_the_dragged_listing(
        segments in prop::collection::vec((0usize..3, 1usize..3), 1..4),
        trailing in 0usize..3,
        source in (any::<prop::sample::Index>(), any::<prop::sample::Index>()),
        target in (any::<prop::sample::Index>(), any::<prop::sample::Index>()),
    ) {
        let disc = layered_disc(&segments, trailing);
        let mut lists = grouped_tracks(&disc);

        let source_list = source.0.index(lists.len());
        prop_assume!(!lists[source_list].tracks.is_empty());
        let source = ListPosition::new(source_list, source.1.index(lists[source_list].tracks.len()));

        let target_list = target.0.index(lists.len());
        let room = lists[target_list].tracks.len() + 1 - usize::from(source_list == target_list);
        let target = ListPosition::new(target_list, target.1.index(room));
        prop_assume!(source != target);

        let moved = lists[source.list].tracks.remove(source.index);
        lists[target.list].tracks.insert(target.index, moved);
        let (expected_order, expected_members) = visual(&lists);

        let device = MockDevice::with_disc(&disc);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let after = runtime.block_on(async {
            let editor = DiscEditor::new(
                TransportHandle::new(device.clone()),
                Arc::new(FixedAnswer(false)),
            )
            .with_settings(EditorSettings {
                control_settle: Duration::ZERO,
            });
            editor.drag_drop_track(source, target).await.unwrap();
            editor.snapshot().disc.unwrap()
        });

        let (order, members) = visual(&grouped_tracks(&after));
        prop_assert_eq!(order, expected_order);
        prop_assert_eq!(members, expected_members);
        prop_assert_eq!(device.snapshot(), after);
    }
}
