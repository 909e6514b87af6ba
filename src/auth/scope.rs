//! Spotify permission scopes and the set type used for subset checks.

// std
use std::collections::btree_set::Iter;
// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError, ser::SerializeSeq};
// self
use crate::_prelude::*;

macro_rules! def_scopes {
	($($variant:ident => $wire:literal, $doc:literal;)+) => {
		/// Permission scope understood by the Spotify Web API.
		#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
		pub enum Scope {
			$(
				#[doc = $doc]
				$variant,
			)+
		}
		impl Scope {
			/// Every scope the API defines, in declaration order.
			pub const ALL: &'static [Scope] = &[$(Scope::$variant),+];

			/// Wire representation used in authorization URLs and token responses.
			pub const fn as_str(self) -> &'static str {
				match self {
					$(Scope::$variant => $wire,)+
				}
			}
		}
		impl FromStr for Scope {
			type Err = ScopeParseError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				match s {
					$($wire => Ok(Scope::$variant),)+
					other => Err(ScopeParseError { scope: other.to_owned() }),
				}
			}
		}
	};
}

def_scopes! {
	UgcImageUpload => "ugc-image-upload", "Upload images to the user's playlists.";
	UserReadPlaybackState => "user-read-playback-state", "Read the user's player state.";
	UserModifyPlaybackState => "user-modify-playback-state", "Control playback on the user's devices.";
	UserReadCurrentlyPlaying => "user-read-currently-playing", "Read the currently playing item.";
	Streaming => "streaming", "Play content through the Web Playback SDK.";
	AppRemoteControl => "app-remote-control", "Remote control playback from mobile SDKs.";
	UserReadEmail => "user-read-email", "Read the user's email address.";
	UserReadPrivate => "user-read-private", "Read subscription details and country.";
	PlaylistReadCollaborative => "playlist-read-collaborative", "Read collaborative playlists.";
	PlaylistModifyPublic => "playlist-modify-public", "Manage the user's public playlists.";
	PlaylistReadPrivate => "playlist-read-private", "Read the user's private playlists.";
	PlaylistModifyPrivate => "playlist-modify-private", "Manage the user's private playlists.";
	UserLibraryModify => "user-library-modify", "Manage saved tracks and albums.";
	UserLibraryRead => "user-library-read", "Read saved tracks and albums.";
	UserTopRead => "user-top-read", "Read the user's top artists and tracks.";
	UserReadPlaybackPosition => "user-read-playback-position", "Read playback position in episodes.";
	UserReadRecentlyPlayed => "user-read-recently-played", "Read recently played tracks.";
	UserFollowRead => "user-follow-read", "Read followed artists and users.";
	UserFollowModify => "user-follow-modify", "Manage followed artists and users.";
}

impl Display for Scope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl Serialize for Scope {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(self.as_str())
	}
}
impl<'de> Deserialize<'de> for Scope {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = <String>::deserialize(deserializer)?;

		raw.parse().map_err(DeError::custom)
	}
}

/// Error returned when a scope string is not recognised.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown scope: {scope}.")]
pub struct ScopeParseError {
	/// The offending scope string.
	pub scope: String,
}

/// Ordered, de-duplicated set of [`Scope`] values.
///
/// Ordering follows the declaration order of [`Scope`], so the space-joined rendering is stable
/// across runs and platforms.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeSet(BTreeSet<Scope>);
impl ScopeSet {
	/// Builds a set from any iterator of scopes.
	pub fn new<I>(scopes: I) -> Self
	where
		I: IntoIterator<Item = Scope>,
	{
		Self(scopes.into_iter().collect())
	}

	/// Parses a space-delimited scope string, skipping values the crate does not know.
	///
	/// Token responses may list scopes introduced after this crate was released; those are
	/// dropped rather than failing the exchange.
	pub fn from_space_delimited_lenient(raw: &str) -> Self {
		Self(raw.split_whitespace().filter_map(|s| s.parse().ok()).collect())
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the set contains `scope`.
	pub fn contains(&self, scope: Scope) -> bool {
		self.0.contains(&scope)
	}

	/// Inserts a scope, returning `true` when it was not yet present.
	pub fn insert(&mut self, scope: Scope) -> bool {
		self.0.insert(scope)
	}

	/// Returns true if every scope in `self` is also present in `other`.
	pub fn is_subset(&self, other: &ScopeSet) -> bool {
		self.0.is_subset(&other.0)
	}

	/// Returns true if `self` grants every scope in `required`.
	pub fn is_superset(&self, required: &ScopeSet) -> bool {
		self.0.is_superset(&required.0)
	}

	/// Scopes in `self` that are missing from `other`.
	pub fn difference(&self, other: &ScopeSet) -> ScopeSet {
		Self(self.0.difference(&other.0).copied().collect())
	}

	/// Iterator over the scopes in order.
	pub fn iter(&self) -> Iter<'_, Scope> {
		self.0.iter()
	}

	/// Space-joined wire representation (the `scope` query/response format).
	pub fn to_space_delimited(&self) -> String {
		self.0.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" ")
	}
}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_set().entries(self.0.iter().map(|s| s.as_str())).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.to_space_delimited())
	}
}
impl FromStr for ScopeSet {
	type Err = ScopeParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		s.split_whitespace().map(Scope::from_str).collect::<Result<BTreeSet<_>, _>>().map(Self)
	}
}
impl FromIterator<Scope> for ScopeSet {
	fn from_iter<T: IntoIterator<Item = Scope>>(iter: T) -> Self {
		Self::new(iter)
	}
}
impl<const N: usize> From<[Scope; N]> for ScopeSet {
	fn from(value: [Scope; N]) -> Self {
		Self::new(value)
	}
}
impl<'a> IntoIterator for &'a ScopeSet {
	type IntoIter = Iter<'a, Scope>;
	type Item = &'a Scope;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}
impl Serialize for ScopeSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(self.0.len()))?;

		for scope in self.0.iter() {
			seq.serialize_element(scope.as_str())?;
		}

		seq.end()
	}
}
impl<'de> Deserialize<'de> for ScopeSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let values = <Vec<Scope>>::deserialize(deserializer)?;

		Ok(Self::new(values))
	}
}
