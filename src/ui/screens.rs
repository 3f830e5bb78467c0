use anyhow::{Context, Result};

use crate::db::{BandService, RepertoireService, Scope, Subscription};
use crate::models::{Band, BandMember, Repertoire, Song};

use super::forms::{LoginForm, RegisterForm};
use super::helpers::clamp_selection;

/// Move a list cursor by `offset`, saturating at both ends.
fn offset_selection(selected: usize, offset: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let target = selected as isize + offset;
    target.clamp(0, len as isize - 1) as usize
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum AuthTab {
    #[default]
    SignIn,
    Register,
}

/// Sign-in and account creation, shown whenever nobody is signed in.
#[derive(Debug, Default)]
pub(crate) struct AuthScreen {
    pub(crate) tab: AuthTab,
    pub(crate) login: LoginForm,
    pub(crate) register: RegisterForm,
}

impl AuthScreen {
    pub(crate) fn switch_tab(&mut self) {
        self.tab = match self.tab {
            AuthTab::SignIn => AuthTab::Register,
            AuthTab::Register => AuthTab::SignIn,
        };
    }
}

/// The signed-in user's repertoires, newest first.
#[derive(Debug)]
pub(crate) struct DashboardScreen {
    pub(crate) owner_id: i64,
    pub(crate) repertoires: Vec<Repertoire>,
    pub(crate) selected: usize,
    subscription: Subscription,
}

impl DashboardScreen {
    pub(crate) fn load(service: &dyn RepertoireService, owner_id: i64) -> Result<Self> {
        let repertoires = service
            .list_repertoires(owner_id)
            .context("failed to load repertoires")?;
        Ok(Self {
            owner_id,
            repertoires,
            selected: 0,
            subscription: service.subscribe(Scope::Repertoires { owner_id }),
        })
    }

    /// Whether the store reported changes since the last call.
    pub(crate) fn has_changes(&self) -> bool {
        !self.subscription.drain().is_empty()
    }

    pub(crate) fn reload(&mut self, service: &dyn RepertoireService) -> Result<()> {
        let focus = self.current().map(|repertoire| repertoire.id);
        self.repertoires = service
            .list_repertoires(self.owner_id)
            .context("failed to reload repertoires")?;
        self.selected = clamp_selection(self.selected, self.repertoires.len());
        if let Some(id) = focus {
            self.select_id(id);
        }
        Ok(())
    }

    pub(crate) fn current(&self) -> Option<&Repertoire> {
        self.repertoires.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = offset_selection(self.selected, offset, self.repertoires.len());
    }

    pub(crate) fn select_id(&mut self, id: i64) {
        if let Some(index) = self.repertoires.iter().position(|r| r.id == id) {
            self.selected = index;
        }
    }
}

/// One repertoire and its ordered songs.
#[derive(Debug)]
pub(crate) struct RepertoireScreen {
    pub(crate) repertoire: Repertoire,
    pub(crate) songs: Vec<Song>,
    pub(crate) selected: usize,
    subscription: Subscription,
}

impl RepertoireScreen {
    pub(crate) fn load(service: &dyn RepertoireService, repertoire: Repertoire) -> Result<Self> {
        let songs = service
            .list_songs(repertoire.id)
            .context("failed to load songs")?;
        let subscription = service.subscribe(Scope::Songs {
            repertoire_id: repertoire.id,
        });
        Ok(Self {
            repertoire,
            songs,
            selected: 0,
            subscription,
        })
    }

    pub(crate) fn has_changes(&self) -> bool {
        !self.subscription.drain().is_empty()
    }

    pub(crate) fn reload(&mut self, service: &dyn RepertoireService) -> Result<()> {
        let focus = self.current_song().map(|song| song.id);
        self.songs = service
            .list_songs(self.repertoire.id)
            .context("failed to reload songs")?;
        self.selected = clamp_selection(self.selected, self.songs.len());
        if let Some(id) = focus {
            self.select_id(id);
        }
        Ok(())
    }

    pub(crate) fn current_song(&self) -> Option<&Song> {
        self.songs.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = offset_selection(self.selected, offset, self.songs.len());
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.songs.len().saturating_sub(1);
    }

    pub(crate) fn select_id(&mut self, id: i64) {
        if let Some(index) = self.songs.iter().position(|s| s.id == id) {
            self.selected = index;
        }
    }
}

/// The user's band, if they have set one up, and its members.
#[derive(Debug)]
pub(crate) struct BandScreen {
    pub(crate) owner_id: i64,
    pub(crate) band: Option<Band>,
    pub(crate) members: Vec<BandMember>,
    pub(crate) selected: usize,
    subscription: Subscription,
}

impl BandScreen {
    pub(crate) fn load(service: &dyn BandService, owner_id: i64) -> Result<Self> {
        let mut screen = Self {
            owner_id,
            band: None,
            members: Vec::new(),
            selected: 0,
            subscription: service.subscribe_band(owner_id),
        };
        screen.reload(service)?;
        Ok(screen)
    }

    pub(crate) fn has_changes(&self) -> bool {
        !self.subscription.drain().is_empty()
    }

    pub(crate) fn reload(&mut self, service: &dyn BandService) -> Result<()> {
        self.band = service
            .find_band(self.owner_id)
            .context("failed to load band")?;
        self.members = match &self.band {
            Some(band) => service
                .list_members(band.id)
                .context("failed to load band members")?,
            None => Vec::new(),
        };
        self.selected = clamp_selection(self.selected, self.members.len());
        Ok(())
    }

    pub(crate) fn current_member(&self) -> Option<&BandMember> {
        self.members.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = offset_selection(self.selected, offset, self.members.len());
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::db::{open_in_memory, ChangeFeed, SqliteStore};
    use crate::models::SongFields;

    fn store_with_owner() -> (SqliteStore, i64) {
        let conn = Rc::new(open_in_memory().unwrap());
        let owner = crate::db::create_user(&conn, "ana@example.com", "Ana", "x$y", true)
            .unwrap()
            .id;
        (SqliteStore::new(conn, ChangeFeed::new()), owner)
    }

    #[test]
    fn offset_selection_saturates() {
        assert_eq!(offset_selection(0, -1, 3), 0);
        assert_eq!(offset_selection(1, 5, 3), 2);
        assert_eq!(offset_selection(0, 1, 0), 0);
    }

    #[test]
    fn dashboard_sees_new_repertoires_through_its_subscription() {
        let (store, owner) = store_with_owner();
        let mut dashboard = DashboardScreen::load(&store, owner).unwrap();
        assert!(dashboard.repertoires.is_empty());
        assert!(!dashboard.has_changes());

        store.create_repertoire("Sunday", None, owner).unwrap();
        assert!(dashboard.has_changes());
        dashboard.reload(&store).unwrap();
        assert_eq!(dashboard.repertoires.len(), 1);
        assert!(!dashboard.has_changes());
    }

    #[test]
    fn repertoire_reload_keeps_focus_on_the_same_song() {
        let (store, owner) = store_with_owner();
        let repertoire = store.create_repertoire("Gig", None, owner).unwrap();
        for title in ["One", "Two", "Three"] {
            store
                .create_song(repertoire.id, &SongFields::titled(title))
                .unwrap();
        }

        let mut screen = RepertoireScreen::load(&store, repertoire).unwrap();
        screen.select_last();
        let focused = screen.current_song().unwrap().id;

        let first = screen.songs[0].id;
        store.delete_song(first).unwrap();
        assert!(screen.has_changes());
        screen.reload(&store).unwrap();
        assert_eq!(screen.current_song().unwrap().id, focused);
        assert_eq!(screen.songs.len(), 2);
    }
}
