//! Users, categories and locations: the reference data events point at.

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Store-assigned id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Unique e-mail address.
    pub email: String,
}

/// Input for user registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// E-mail address; must be unique.
    pub email: String,
}

/// The public face of a user embedded in events and comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserShort {
    /// User id.
    pub id: i64,
    /// Display name.
    pub name: String,
}

impl From<&User> for UserShort {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
        }
    }
}

/// An event category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Store-assigned id.
    pub id: i64,
    /// Unique name.
    pub name: String,
}

/// A stored venue position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    /// Store-assigned id.
    pub id: i64,
    /// Latitude, unchecked.
    pub lat: f64,
    /// Longitude, unchecked.
    pub lon: f64,
}

/// A latitude/longitude pair not yet stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude, unchecked.
    pub lat: f64,
    /// Longitude, unchecked.
    pub lon: f64,
}

impl Location {
    /// Coordinates of this location.
    #[must_use]
    pub const fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lon: self.lon,
        }
    }
}
