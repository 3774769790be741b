//! Per-entity UUID newtypes.
//!
//! Each id is a distinct type so a `ProgramId` cannot be passed where a
//! `DepartmentId` is expected. They bind and decode as Postgres `UUID`
//! (including `UUID[]`) and serialize as plain UUID strings.

use serde::{Deserialize, Serialize};
use sqlx::{
    Database, Decode, Encode, Type,
    postgres::{PgHasArrayType, PgTypeInfo},
};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
        )]
        #[serde(transparent)]
        #[schema(value_type = String, format = "uuid")]
        pub struct $name(pub Uuid);

        impl $name {
            #[inline]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[inline]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            #[inline]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            #[inline]
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            #[inline]
            fn from(id: $name) -> Uuid {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl Type<sqlx::Postgres> for $name {
            fn type_info() -> PgTypeInfo {
                <Uuid as Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &PgTypeInfo) -> bool {
                <Uuid as Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'q> Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::Postgres as Database>::ArgumentBuffer<'q>,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <Uuid as Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }

        impl<'r> Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: <sqlx::Postgres as Database>::ValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                <Uuid as Decode<'r, sqlx::Postgres>>::decode(value).map(Self)
            }
        }

        impl PgHasArrayType for $name {
            fn array_type_info() -> PgTypeInfo {
                <Uuid as PgHasArrayType>::array_type_info()
            }
        }
    };
}

define_id!(
    /// Id of a [`User`](crate::users::User).
    UserId
);
define_id!(
    /// Id of a [`Department`](crate::departments::Department).
    DepartmentId
);
define_id!(
    /// Id of a [`Program`](crate::programs::Program).
    ProgramId
);
define_id!(
    /// Id of a [`Course`](crate::courses::Course).
    CourseId
);
define_id!(
    /// Id of a [`Teacher`](crate::teachers::Teacher).
    TeacherId
);
define_id!(
    /// Id of a [`Student`](crate::students::Student).
    StudentId
);
define_id!(
    /// Id of a [`Timetable`](crate::timetables::Timetable).
    TimetableId
);
define_id!(
    /// Id of an [`ExamTimetable`](crate::exams::ExamTimetable) entry.
    ExamId
);
define_id!(
    /// Id of a [`CourseResult`](crate::results::CourseResult).
    ResultId
);
define_id!(
    /// Id of an [`Announcement`](crate::announcements::Announcement).
    AnnouncementId
);
define_id!(
    /// Id of an [`Event`](crate::events::Event).
    EventId
);
define_id!(
    /// Id of a [`ScreeningSlot`](crate::admissions::ScreeningSlot).
    ScreeningSlotId
);
define_id!(
    /// Id of a reference [`Level`](crate::levels::Level).
    LevelId
);
define_id!(
    /// Id of a [`StoredFile`](crate::files::StoredFile) record.
    FileId
);
