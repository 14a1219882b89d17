use std::fmt;
use std::str::FromStr;

/// The URL prefix under which a CVP release serves its portal API.
///
/// Determines login and every endpoint path. Releases before 2018.1
/// answer under `/web`; later releases answer under `/cvpservice`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiPrefix {
    /// Legacy CVP releases -- `/web/...`.
    Web,
    /// CVP 2018.1 and later -- `/cvpservice/...`.
    #[default]
    CvpService,
}

impl ApiPrefix {
    /// The path prefix prepended to every portal endpoint.
    pub fn path(self) -> &'static str {
        match self {
            Self::Web => "/web",
            Self::CvpService => "/cvpservice",
        }
    }

    /// The login endpoint path.
    pub fn login_path(self) -> String {
        format!("{}/login/authenticate.do", self.path())
    }

    /// The logout endpoint path.
    pub fn logout_path(self) -> String {
        format!("{}/login/logout.do", self.path())
    }

    /// The endpoint probed during prefix detection.
    pub fn probe_path(self) -> String {
        format!("{}/cvpInfo/getCvpInfo.do", self.path())
    }
}

impl fmt::Display for ApiPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Web => f.write_str("web"),
            Self::CvpService => f.write_str("cvpservice"),
        }
    }
}

impl FromStr for ApiPrefix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_matches('/') {
            "web" => Ok(Self::Web),
            "cvpservice" => Ok(Self::CvpService),
            other => Err(format!("expected 'web' or 'cvpservice', got '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_prefix() {
        assert_eq!(ApiPrefix::Web.login_path(), "/web/login/authenticate.do");
        assert_eq!(
            ApiPrefix::CvpService.logout_path(),
            "/cvpservice/login/logout.do"
        );
    }

    #[test]
    fn parses_with_or_without_slashes() {
        assert_eq!("/web".parse::<ApiPrefix>(), Ok(ApiPrefix::Web));
        assert_eq!("cvpservice".parse::<ApiPrefix>(), Ok(ApiPrefix::CvpService));
        assert!("api".parse::<ApiPrefix>().is_err());
    }
}
