//! Test Helpers

use custody::{
    catalog::{Catalog, CatalogEntry},
    ids::{TokenId, UserId},
    items::RequestItem,
};

use testresult::TestResult;

use crate::{
    domain::{
        requests::{LedgerService, data::NewRequest, records::RequestRecord},
        transitions::TransitionsService,
    },
    test::TestContext,
};

pub(crate) const REQUESTER: UserId = UserId::new(1001);
pub(crate) const APPROVER: UserId = UserId::new(2001);
pub(crate) const CUSTODIAN: UserId = UserId::new(3001);
pub(crate) const ADMIN: UserId = UserId::new(4001);

const COMPANIES: [(&str, &str); 4] = [
    ("Northwind Grain", "KEY-01"),
    ("Harbor Elevator", "KEY-02"),
    ("Prairie Mills", "KEY-03"),
    ("Summit Feed", "KEY-04"),
];

pub(crate) fn catalog() -> Catalog {
    let entries = COMPANIES
        .iter()
        .map(|(company, token)| CatalogEntry {
            company: (*company).to_string(),
            token_id: TokenId::new(*token),
            description: None,
        })
        .collect();

    Catalog::new(entries).expect("test catalog is valid")
}

/// A request by [`REQUESTER`] for the given tokens, labelled with their catalog companies.
pub(crate) fn new_request(tokens: &[&str]) -> NewRequest {
    let items = tokens
        .iter()
        .map(|token| {
            let company = COMPANIES
                .iter()
                .find(|(_, t)| t == token)
                .map_or("Unlisted Co", |(company, _)| *company);

            RequestItem::new(company, *token)
        })
        .collect();

    NewRequest {
        requester_id: REQUESTER,
        requester_display_name: None,
        items,
        purpose: "Sign export declarations".to_string(),
        comment: None,
    }
}

impl TestContext {
    pub(crate) async fn create_request(&self, tokens: &[&str]) -> TestResult<RequestRecord> {
        self.submit(new_request(tokens)).await
    }

    pub(crate) async fn create_request_as(
        &self,
        requester: UserId,
        tokens: &[&str],
    ) -> TestResult<RequestRecord> {
        self.submit(NewRequest {
            requester_id: requester,
            ..new_request(tokens)
        })
        .await
    }

    pub(crate) async fn create_named_request(
        &self,
        name: &str,
        tokens: &[&str],
    ) -> TestResult<RequestRecord> {
        self.submit(NewRequest {
            requester_display_name: Some(name.to_string()),
            ..new_request(tokens)
        })
        .await
    }

    async fn submit(&self, request: NewRequest) -> TestResult<RequestRecord> {
        let id = self.transitions.create_request(request).await?;

        Ok(self.ledger.get_request(id).await?)
    }
}
