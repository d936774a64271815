/// One status, identified by its ActivityPub uri. Different instances serve
/// different partial views of the same toot; everything here canonicalizes
/// onto the uri.
#[derive(Clone, Debug)]
pub struct Toot {
    pub uri: String,

    /// Last path segment of `uri`. Numeric on Mastodon, a flake id on
    /// Pleroma.
    pub toot_id: String,

    /// Author handle, home-instance-relative.
    pub acct: String,

    /// Numeric id at the home instance. Empty until learned.
    pub source_id: String,

    /// Instance and numeric id of the copy we first observed, which may be
    /// a federation cache rather than the home instance.
    pub local_instance: String,
    pub local_id: String,

    /// Discovered through a `/context` call on another toot.
    pub from_thread: bool,

    /// Favourite count, if any server reported one.
    pub favor: u32,

    /// Reply count, if reported (or 1 when the toot is itself a reply).
    pub related: u32,
}
