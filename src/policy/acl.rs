//! Access-control list derived from tender state
//!
//! Never stored: bid statuses move between requests, so the list is rebuilt
//! for every access decision.

use serde::Serialize;
use std::fmt;

use crate::domain::{BidStatus, Tender};

/// Group principal of the stage-transition service
pub const DIALOGUE_GROUP: &str = "competitive_dialogue";

/// Who a grant applies to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Principal {
    /// Bearer credential: whoever presents both owner and token
    Owner { owner: String, token: String },
    Group(&'static str),
}

impl Principal {
    pub fn owner(owner: &str, token: &str) -> Self {
        Principal::Owner {
            owner: owner.to_string(),
            token: token.to_string(),
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::Owner { owner, token } => write!(f, "{}_{}", owner, token),
            Principal::Group(name) => write!(f, "g:{}", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    CreateQualificationComplaint,
    CreateAwardComplaint,
    EditTender,
    UploadTenderDocuments,
    EditComplaint,
    ExtractCredentials,
    GenerateCredentials,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::CreateQualificationComplaint => "create_qualification_complaint",
            Permission::CreateAwardComplaint => "create_award_complaint",
            Permission::EditTender => "edit_tender",
            Permission::UploadTenderDocuments => "upload_tender_documents",
            Permission::EditComplaint => "edit_complaint",
            Permission::ExtractCredentials => "extract_credentials",
            Permission::GenerateCredentials => "generate_credentials",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One allow grant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclEntry {
    pub principal: Principal,
    pub permission: Permission,
}

impl AclEntry {
    fn allow(principal: Principal, permission: Permission) -> Self {
        Self {
            principal,
            permission,
        }
    }
}

/// Grants currently in force for `tender`
pub fn derive_acl(tender: &Tender) -> Vec<AclEntry> {
    let policy = tender.variant().policy().acl;
    let mut acl = Vec::new();

    if policy.dialogue_token_generates_credentials {
        if let Some(dialogue_token) = tender.dialogue_token.as_deref() {
            acl.push(AclEntry::allow(
                Principal::owner(&tender.owner, dialogue_token),
                Permission::GenerateCredentials,
            ));
        }
    }

    acl.extend(
        tender
            .bids
            .iter()
            .filter(|bid| matches!(bid.status, BidStatus::Active | BidStatus::Unsuccessful))
            .map(|bid| {
                AclEntry::allow(
                    Principal::owner(&bid.owner, &bid.owner_token),
                    Permission::CreateQualificationComplaint,
                )
            }),
    );
    acl.extend(
        tender
            .bids
            .iter()
            .filter(|bid| bid.status == BidStatus::Active)
            .map(|bid| {
                AclEntry::allow(
                    Principal::owner(&bid.owner, &bid.owner_token),
                    Permission::CreateAwardComplaint,
                )
            }),
    );

    let owner = Principal::owner(&tender.owner, &tender.owner_token);
    for permission in [
        Permission::EditTender,
        Permission::UploadTenderDocuments,
        Permission::EditComplaint,
    ] {
        acl.push(AclEntry::allow(owner.clone(), permission));
    }

    if policy.group_extracts_credentials {
        acl.push(AclEntry::allow(
            Principal::Group(DIALOGUE_GROUP),
            Permission::ExtractCredentials,
        ));
    }
    acl.push(AclEntry::allow(
        Principal::Group(DIALOGUE_GROUP),
        Permission::EditTender,
    ));

    acl
}

/// Whether any of `principals` holds `permission` in `acl`
pub fn permits(acl: &[AclEntry], principals: &[String], permission: Permission) -> bool {
    acl.iter().any(|entry| {
        entry.permission == permission
            && principals
                .iter()
                .any(|p| *p == entry.principal.to_string())
    })
}

/// Distinct permissions any of `principals` holds
pub fn held_permissions(acl: &[AclEntry], principals: &[String]) -> Vec<Permission> {
    let mut held: Vec<Permission> = Vec::new();
    for entry in acl {
        let principal = entry.principal.to_string();
        if principals.iter().any(|p| *p == principal) && !held.contains(&entry.permission) {
            held.push(entry.permission);
        }
    }
    held
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bid;
    use serde_json::json;

    fn tender(variant: &str, bids: &[(&str, &str)]) -> Tender {
        let bids: Vec<_> = bids
            .iter()
            .map(|(owner, status)| {
                json!({"id": owner, "status": status, "owner": owner,
                       "owner_token": format!("{owner}-token"), "tenderers": []})
            })
            .collect();
        serde_json::from_value(json!({
            "id": "t1",
            "procurementMethodType": variant,
            "status": "active.pre-qualification",
            "title": "Road repair",
            "owner": "broker",
            "owner_token": "tender-token",
            "dialogue_token": "hashed",
            "value": {"amount": 1000},
            "bids": bids
        }))
        .unwrap()
    }

    fn holders(acl: &[AclEntry], permission: Permission) -> Vec<String> {
        acl.iter()
            .filter(|e| e.permission == permission)
            .map(|e| e.principal.to_string())
            .collect()
    }

    #[test]
    fn complaint_grants_follow_bid_status() {
        let tender = tender(
            "competitiveDialogueEU",
            &[("a", "active"), ("b", "unsuccessful"), ("c", "invalid")],
        );
        let acl = derive_acl(&tender);

        assert_eq!(
            holders(&acl, Permission::CreateQualificationComplaint),
            vec!["a_a-token", "b_b-token"]
        );
        assert_eq!(holders(&acl, Permission::CreateAwardComplaint), vec!["a_a-token"]);
    }

    #[test]
    fn stage1_owner_and_group_grants() {
        let acl = derive_acl(&tender("competitiveDialogueUA", &[]));

        for permission in [
            Permission::EditTender,
            Permission::UploadTenderDocuments,
            Permission::EditComplaint,
        ] {
            assert!(holders(&acl, permission).contains(&"broker_tender-token".to_string()));
        }
        assert_eq!(
            holders(&acl, Permission::ExtractCredentials),
            vec!["g:competitive_dialogue"]
        );
        assert!(holders(&acl, Permission::EditTender).contains(&"g:competitive_dialogue".to_string()));
        assert!(holders(&acl, Permission::GenerateCredentials).is_empty());
    }

    #[test]
    fn stage2_grants_credentials_by_dialogue_token() {
        let acl = derive_acl(&tender("competitiveDialogueEU.stage2", &[]));

        assert_eq!(holders(&acl, Permission::GenerateCredentials), vec!["broker_hashed"]);
        assert!(holders(&acl, Permission::ExtractCredentials).is_empty());
        assert!(holders(&acl, Permission::EditTender).contains(&"g:competitive_dialogue".to_string()));
    }

    #[test]
    fn acl_reflects_current_bid_state() {
        let mut tender = tender("competitiveDialogueEU", &[("a", "active")]);
        assert_eq!(holders(&derive_acl(&tender), Permission::CreateAwardComplaint).len(), 1);

        let bid: &mut Bid = tender.bid_mut("a").unwrap();
        bid.status = BidStatus::Invalid;
        let acl = derive_acl(&tender);
        assert!(holders(&acl, Permission::CreateAwardComplaint).is_empty());
        assert!(holders(&acl, Permission::CreateQualificationComplaint).is_empty());
    }

    #[test]
    fn permits_matches_any_principal() {
        let acl = derive_acl(&tender("competitiveDialogueEU", &[("a", "active")]));
        let principals = vec!["nobody_x".to_string(), "a_a-token".to_string()];

        assert!(permits(&acl, &principals, Permission::CreateAwardComplaint));
        assert!(!permits(&acl, &principals, Permission::EditTender));
        assert_eq!(
            held_permissions(&acl, &principals),
            vec![
                Permission::CreateQualificationComplaint,
                Permission::CreateAwardComplaint
            ]
        );
    }
}
