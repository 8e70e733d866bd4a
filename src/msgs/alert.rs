use crate::enums::{AlertDescription, AlertLevel};
use crate::msgs::codec::{Codec, Reader};

#[derive(Debug)]
pub(crate) struct AlertMessagePayload {
    pub(crate) level: AlertLevel,
    pub(crate) description: AlertDescription,
}

impl Codec for AlertMessagePayload {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.level.encode(bytes);
        self.description.encode(bytes);
    }

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        let level = AlertLevel::read(r)?;
        let description = AlertDescription::read(r)?;

        Some(Self { level, description })
    }
}
