use domain_types::connector_types::ConnectorEnum;
use interfaces::connector_types::BoxedConnector;

use crate::connectors;

#[derive(Clone)]
pub struct ConnectorData {
    pub connector: BoxedConnector,
    pub connector_name: ConnectorEnum,
}

impl ConnectorData {
    pub fn get_connector_by_name(connector_name: &ConnectorEnum) -> Self {
        let connector = Self::convert_connector(*connector_name);
        Self {
            connector,
            connector_name: *connector_name,
        }
    }

    fn convert_connector(connector_name: ConnectorEnum) -> BoxedConnector {
        match connector_name {
            ConnectorEnum::Sagepaydirect => Box::new(connectors::Sagepaydirect::new()),
            ConnectorEnum::Sagepayserver => Box::new(connectors::Sagepayserver::new()),
            ConnectorEnum::Sagepayform => Box::new(connectors::Sagepayform::new()),
            ConnectorEnum::Sagepaypi => Box::new(connectors::Sagepaypi::new()),
        }
    }
}

pub struct ResponseRouterData<Response, RouterData> {
    pub response: Response,
    pub router_data: RouterData,
    pub http_code: u16,
}
