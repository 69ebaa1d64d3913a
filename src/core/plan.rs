//! Subscription plans and their quotas.

use crate::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    Free,
    Starter,
    Pro,
    Enterprise,
}

impl Plan {
    /// Unknown plan strings get FREE limits rather than failing the request.
    pub fn from_str_lenient(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "STARTER" => Plan::Starter,
            "PRO" => Plan::Pro,
            "ENTERPRISE" => Plan::Enterprise,
            _ => Plan::Free,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "FREE",
            Plan::Starter => "STARTER",
            Plan::Pro => "PRO",
            Plan::Enterprise => "ENTERPRISE",
        }
    }

    pub fn whatsapp_number_limit(&self) -> i64 {
        match self {
            Plan::Free => 1,
            Plan::Starter => 3,
            Plan::Pro => 5,
            Plan::Enterprise => 20,
        }
    }

    pub fn check_whatsapp_capacity(&self, current_count: i64) -> Result<(), ServiceError> {
        let limit = self.whatsapp_number_limit();
        if current_count >= limit {
            return Err(ServiceError::conflict(
                "PLAN_LIMIT_REACHED",
                format!(
                    "{} plan allows {} WhatsApp number{}",
                    self.as_str(),
                    limit,
                    if limit == 1 { "" } else { "s" }
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_parsing() {
        assert_eq!(Plan::from_str_lenient("pro"), Plan::Pro);
        assert_eq!(Plan::from_str_lenient("ENTERPRISE"), Plan::Enterprise);
        assert_eq!(Plan::from_str_lenient("gold"), Plan::Free);
        assert_eq!(Plan::from_str_lenient(""), Plan::Free);
    }

    #[test]
    fn test_capacity_check() {
        assert!(Plan::Free.check_whatsapp_capacity(0).is_ok());
        assert!(Plan::Free.check_whatsapp_capacity(1).is_err());
        assert!(Plan::Starter.check_whatsapp_capacity(2).is_ok());
        assert!(Plan::Starter.check_whatsapp_capacity(3).is_err());
        assert!(Plan::Enterprise.check_whatsapp_capacity(19).is_ok());
    }

    #[test]
    fn test_limit_error_shape() {
        let err = Plan::Free.check_whatsapp_capacity(1).unwrap_err();
        match err {
            ServiceError::Conflict { code, message } => {
                assert_eq!(code, "PLAN_LIMIT_REACHED");
                assert_eq!(message, "FREE plan allows 1 WhatsApp number");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
